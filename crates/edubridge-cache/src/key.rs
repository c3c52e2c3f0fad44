// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache key derivation and per-kind expiry.

use std::str::FromStr;
use std::time::Duration;

use edubridge_config::model::{CacheConfig, TtlConfig};
use edubridge_core::CacheKind;

/// `<school>:<user id>:<kind>`, where `school` is the server without its domain.
pub fn cache_key(server: &str, user_id: &str, kind: &str) -> String {
    let school = server.split('.').next().unwrap_or(server);
    format!("{school}:{user_id}:{kind}")
}

/// Expiry per entity kind.
#[derive(Debug, Clone, Default)]
pub struct CachePolicy {
    ttl: TtlConfig,
}

impl CachePolicy {
    pub fn new(ttl: TtlConfig) -> Self {
        Self { ttl }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl.clone())
    }

    /// Configured expiry for `kind`. Unknown kinds get zero, meaning "do not cache".
    pub fn ttl_for(&self, kind: &str) -> Duration {
        CacheKind::from_str(kind)
            .map(|kind| self.ttl.for_kind(kind))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_cacheable(&self, kind: &str) -> bool {
        !self.ttl_for(kind).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_domain() {
        assert_eq!(
            cache_key("gymnazium.edupage.org", "Student42", "timeline"),
            "gymnazium:Student42:timeline"
        );
        assert_eq!(cache_key("gymnazium", "Student42", "dbi"), "gymnazium:Student42:dbi");
    }

    #[test]
    fn ttl_per_kind_and_zero_for_unknown() {
        let policy = CachePolicy::new(TtlConfig {
            timeline: 60,
            timetable: 120,
            results: 0,
            dbi: 3600,
        });
        assert_eq!(policy.ttl_for("timeline"), Duration::from_secs(60));
        assert_eq!(policy.ttl_for("timetable"), Duration::from_secs(120));
        assert_eq!(policy.ttl_for("dbi"), Duration::from_secs(3600));
        assert!(!policy.is_cacheable("results"));
        assert_eq!(policy.ttl_for("canteen"), Duration::ZERO);
        assert_eq!(policy.ttl_for(""), Duration::ZERO);
    }
}
