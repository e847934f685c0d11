use async_trait::async_trait;
use chrono::Duration;
use railbook_domain::leg::{LegRef, PassengerType, ScheduleOption};

/// Errors from the external seat/fare backend. Seat contention is an expected
/// business outcome and is kept separate from transport trouble so callers
/// can apply different retry policies.
#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("Seats already taken: {seat_ids:?}")]
    SeatsTaken { seat_ids: Vec<String> },

    #[error("Leg not found: {0}")]
    UnknownLeg(String),

    #[error("Supplier transport failure: {0}")]
    Transport(String),
}

/// Abstract contract for the seat/fare lookup and inventory-lock service.
/// Consumed, never implemented for real, by the orchestration core; the
/// backing service owns seat-level lock enforcement.
#[async_trait]
pub trait SeatSupplier: Send + Sync {
    /// Scheduled departures for a leg, with per-class availability and price.
    /// Idempotent read; safe to retry once on transport failure.
    async fn search(
        &self,
        leg: &LegRef,
        passenger_count: u32,
    ) -> Result<Vec<ScheduleOption>, SupplierError>;

    /// Claim specific seats for `ttl`. A `SeatsTaken` rejection means another
    /// party holds at least one of them; the orchestrator never retries this
    /// blindly and never substitutes different seats.
    async fn hold_seats(
        &self,
        leg: &LegRef,
        seat_ids: &[String],
        ttl: Duration,
    ) -> Result<(), SupplierError>;

    /// Return seats to open inventory. Idempotent on the supplier side.
    async fn release_seats(&self, leg: &LegRef, seat_ids: &[String]) -> Result<(), SupplierError>;

    /// Price a passenger mix on a leg. Called exactly once per reservation,
    /// at conversion time; the result is frozen into the reservation.
    async fn quote_fare(
        &self,
        leg: &LegRef,
        passenger_types: &[PassengerType],
    ) -> Result<i64, SupplierError>;
}
