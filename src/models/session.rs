//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token issued after a successful confirmation-code exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token, also the primary key
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Issue a new random token for `user_id`, valid for `ttl`.
    pub fn issue(user_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_generates_distinct_tokens() {
        let a = Session::issue(1, Duration::days(7));
        let b = Session::issue(1, Duration::days(7));

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert!(!a.is_expired());
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        assert!(Session::issue(1, Duration::seconds(-1)).is_expired());
    }
}
