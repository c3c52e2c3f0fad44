// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secrets from the environment or an interactive prompt.

use edubridge_core::PortalError;
use secrecy::SecretString;

/// Portal password for `fetch`.
pub const PASSWORD_ENV_VAR: &str = "EDUBRIDGE_PASSWORD";

/// SQLCipher passphrase for the account database when encryption is enabled.
pub const DB_KEY_ENV_VAR: &str = "EDUBRIDGE_DB_KEY";

/// Read a secret from `env_var`, else prompt on the terminal with `label`.
///
/// Fails when the variable is unset and stdin is not a terminal.
pub fn read_secret(env_var: &str, label: &str) -> Result<SecretString, PortalError> {
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("{label}: ");
        let value = rpassword::read_password()
            .map_err(|e| PortalError::Config(format!("failed to read {label}: {e}")))?;
        if value.is_empty() {
            return Err(PortalError::Config(format!("empty {label} not allowed")));
        }
        return Ok(SecretString::from(value));
    }

    Err(PortalError::Config(format!(
        "no {label} provided. Set {env_var} or run interactively."
    )))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn env_var_wins() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("EDUBRIDGE_TEST_SECRET_A", "hunter2") };
        let secret = read_secret("EDUBRIDGE_TEST_SECRET_A", "password").unwrap();
        assert_eq!(secret.expose_secret(), "hunter2");
    }
}
