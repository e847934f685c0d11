use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Explicit per-call session identity. Passed into every orchestrator
/// operation; there is no ambient global token state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Stable subject id ("guest-<uuid>" for anonymous sessions).
    pub session_id: String,
    pub token_expiry: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(session_id: String, token_expiry: DateTime<Utc>) -> Self {
        Self {
            session_id,
            token_expiry,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_validity_window() {
        let now = Utc::now();
        let ctx = SessionContext::new("guest-1".to_string(), now + Duration::hours(1));
        assert!(ctx.is_valid(now));
        assert!(!ctx.is_valid(now + Duration::hours(2)));
    }
}
