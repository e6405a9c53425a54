//! The durable account record.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use vigil_types::PlayerId;

/// Current wall-clock time as unix milliseconds.
///
/// Account timestamps use wall-clock time (not a monotonic clock) because
/// they're persisted and compared across process restarts.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A registered player's credential record.
///
/// Every field is required on load: a record missing any of them is
/// treated as unreadable and skipped, rather than silently filled with
/// defaults — a half-parsed credential record is worse than none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable player identity. Unique and immutable once created.
    pub id: PlayerId,
    /// Display name at registration time (refreshed on login).
    pub display_name: String,
    /// PHC-format password hash. The only secret-derived data we store.
    pub password_hash: String,
    /// Unix ms when the account was registered.
    pub created_at: u64,
    /// Unix ms of the most recent successful login.
    pub last_login: u64,
    /// Network origin of the most recent successful login.
    pub last_ip: String,
    /// Number of successful logins, registration included.
    pub login_count: u32,
}

impl Account {
    /// A fresh account as created by registration. Registration counts as
    /// the first login.
    pub fn new(
        id: PlayerId,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        ip: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            password_hash: password_hash.into(),
            created_at: now_ms,
            last_login: now_ms,
            last_ip: ip.into(),
            login_count: 1,
        }
    }

    /// Updates the login metadata after a successful authentication.
    pub fn record_login(&mut self, ip: impl Into<String>, now_ms: u64) {
        self.last_login = now_ms;
        self.last_ip = ip.into();
        self.login_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counts_registration_as_first_login() {
        let acc = Account::new(PlayerId::random(), "steve", "$argon2id$x", "1.2.3.4", 1000);
        assert_eq!(acc.login_count, 1);
        assert_eq!(acc.created_at, 1000);
        assert_eq!(acc.last_login, 1000);
        assert_eq!(acc.last_ip, "1.2.3.4");
    }

    #[test]
    fn test_record_login_updates_metadata_only() {
        let mut acc = Account::new(PlayerId::random(), "steve", "$argon2id$x", "1.2.3.4", 1000);
        acc.record_login("5.6.7.8", 2000);
        assert_eq!(acc.login_count, 2);
        assert_eq!(acc.last_login, 2000);
        assert_eq!(acc.last_ip, "5.6.7.8");
        // Untouched.
        assert_eq!(acc.created_at, 1000);
        assert_eq!(acc.password_hash, "$argon2id$x");
    }

    #[test]
    fn test_missing_field_fails_deserialization() {
        // No serde defaults: a record without a password hash must not load.
        let json = format!(
            r#"{{"id":"{}","display_name":"steve","created_at":1,"last_login":1,"last_ip":"x","login_count":1}}"#,
            PlayerId::random()
        );
        assert!(serde_json::from_str::<Account>(&json).is_err());
    }
}
