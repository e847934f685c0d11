use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leg::{LegRef, PassengerType};

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    AwaitingPayment,
    Paid,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::AwaitingPayment)
    }
}

/// Denormalized seat snapshot taken at conversion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub car: String,
    pub seat_number: String,
    pub passenger_type: PassengerType,
}

/// Canonical seat id form used everywhere a seat crosses a boundary:
/// "<car>-<seat>", with car "1" assumed when no prefix is given.
pub fn canonical_seat_id(seat_id: &str) -> String {
    if seat_id.contains('-') {
        seat_id.to_string()
    } else {
        format!("1-{seat_id}")
    }
}

impl SeatAssignment {
    /// Seat ids are written "<car>-<seat>", e.g. "3-12A". A seat id with no
    /// car prefix lands in car "1".
    pub fn from_seat_id(seat_id: &str, passenger_type: PassengerType) -> Self {
        match seat_id.split_once('-') {
            Some((car, seat)) => Self {
                car: car.to_string(),
                seat_number: seat.to_string(),
                passenger_type,
            },
            None => Self {
                car: "1".to_string(),
                seat_number: seat_id.to_string(),
                passenger_type,
            },
        }
    }

    pub fn seat_id(&self) -> String {
        format!("{}-{}", self.car, self.seat_number)
    }
}

/// A priced, payable commitment derived from a successful Hold.
///
/// The fare is fixed at conversion time and never recomputed from live
/// pricing afterward. A Reservation is a price quote, not a live query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    /// Origin hold; unique across all reservations ever created.
    pub hold_id: Uuid,
    pub leg: LegRef,
    pub fare_krw: i64,
    pub seats: Vec<SeatAssignment>,
    pub payment_deadline: DateTime<Utc>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Deadline-aware status read. An AWAITING_PAYMENT reservation past its
    /// payment deadline is already expired from every caller's point of view.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        if self.status == ReservationStatus::AwaitingPayment && now >= self.payment_deadline {
            ReservationStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_payable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ReservationStatus::AwaitingPayment
    }
}
