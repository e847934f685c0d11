use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentOutcome {
    Pending,
    Paid,
    UserCancelled,
    /// The gateway declined the charge.
    Failed,
    /// Dropped before any gateway decision: targets went stale, the amount
    /// diverged, or transport failed. Kept distinct from FAILED so the intent
    /// history never reads as a decline that did not happen.
    Discarded,
}

/// A request to charge a fixed amount against one or more reservations.
///
/// The amount is derived at prepare time and re-validated at execute time: it
/// must always equal the sum of the target reservations' immutable fares, and
/// the intent fails closed if any target went stale in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: Uuid,
    /// Opaque correlation id issued by the external payment gateway.
    pub order_id: String,
    pub target_reservation_ids: Vec<Uuid>,
    pub amount_krw: i64,
    pub outcome: IntentOutcome,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_pending(&self) -> bool {
        self.outcome == IntentOutcome::Pending
    }
}
