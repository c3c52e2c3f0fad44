// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production [`Authenticator`]: portal login followed by the first user fetch.

use async_trait::async_trait;
use edubridge_core::{Authenticator, PortalError, StoredUser};
use edubridge_portal::{Connector, EduClient};
use tracing::debug;

pub struct PortalAuthenticator {
    connector: Connector,
}

impl PortalAuthenticator {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }
}

#[async_trait]
impl Authenticator for PortalAuthenticator {
    type Session = EduClient;

    async fn authenticate(&self, user: &StoredUser) -> Result<EduClient, PortalError> {
        let password = user.password.as_ref().ok_or_else(|| {
            PortalError::Config(format!("no stored password for {}", user.username))
        })?;
        let credentials = self
            .connector
            .login(&user.server, &user.username, password)
            .await?;
        let client = EduClient::connect(credentials).await?;
        debug!(server = %user.server, username = %user.username, "client authenticated");
        Ok(client)
    }

    async fn ping(&self, session: &EduClient) -> Result<bool, PortalError> {
        session.ping_session().await
    }

    async fn release(&self, session: &EduClient) {
        session.close().await;
    }
}
