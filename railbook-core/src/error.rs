use uuid::Uuid;

/// Reason-coded rejection returned by every orchestrator operation.
///
/// Each variant carries the specific entity ids affected so callers can build
/// partial-failure views ("3 of 4 cart items expired") instead of a blanket
/// error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Reject {
    #[error("Seats no longer available: {seat_ids:?}")]
    SeatsUnavailable { seat_ids: Vec<String> },

    #[error("Hold expired: {hold_id}")]
    HoldExpired { hold_id: Uuid },

    #[error("Hold not found: {hold_id}")]
    HoldNotFound { hold_id: Uuid },

    #[error("Hold already converted: {hold_id}")]
    AlreadyConverted { hold_id: Uuid },

    #[error("Outbound leg not secured; inbound operations are gated")]
    OutboundNotSecured,

    #[error("Payment intent already in flight for reservations: {reservation_ids:?}")]
    IntentInProgress { reservation_ids: Vec<Uuid> },

    #[error("Reservations not awaiting payment: {reservation_ids:?}")]
    NotAwaitingPayment { reservation_ids: Vec<Uuid> },

    #[error("Round trip incomplete: {trip_id}")]
    TripIncomplete { trip_id: Uuid },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("External service {service} unavailable: {detail}")]
    Upstream { service: String, detail: String },

    #[error("State corruption: {0}")]
    StateCorruption(String),
}

impl Reject {
    /// Machine-readable reason code, stable across releases.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Reject::SeatsUnavailable { .. } => "SEATS_UNAVAILABLE",
            Reject::HoldExpired { .. } => "HOLD_EXPIRED",
            Reject::HoldNotFound { .. } => "HOLD_NOT_FOUND",
            Reject::AlreadyConverted { .. } => "ALREADY_CONVERTED",
            Reject::OutboundNotSecured => "OUTBOUND_NOT_SECURED",
            Reject::IntentInProgress { .. } => "INTENT_IN_PROGRESS",
            Reject::NotAwaitingPayment { .. } => "NOT_AWAITING_PAYMENT",
            Reject::TripIncomplete { .. } => "TRIP_INCOMPLETE",
            Reject::InvalidRequest(_) => "INVALID_REQUEST",
            Reject::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Reject::StateCorruption(_) => "STATE_CORRUPTION",
        }
    }

    /// Entity ids affected, rendered for the wire-level error body.
    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            Reject::SeatsUnavailable { seat_ids } => seat_ids.clone(),
            Reject::HoldExpired { hold_id }
            | Reject::HoldNotFound { hold_id }
            | Reject::AlreadyConverted { hold_id } => vec![hold_id.to_string()],
            Reject::IntentInProgress { reservation_ids }
            | Reject::NotAwaitingPayment { reservation_ids } => {
                reservation_ids.iter().map(|id| id.to_string()).collect()
            }
            Reject::TripIncomplete { trip_id } => vec![trip_id.to_string()],
            _ => Vec::new(),
        }
    }

    /// Expected business rejections are not system failures and must never be
    /// logged as errors. Transport trouble and state corruption are.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Reject::Upstream { .. } | Reject::StateCorruption(_)
        )
    }
}

pub type RejectResult<T> = Result<T, Reject>;
