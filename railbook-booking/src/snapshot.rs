use railbook_core::session::SessionContext;
use railbook_domain::hold::Hold;
use railbook_domain::payment::PaymentIntent;
use railbook_domain::reservation::Reservation;
use railbook_domain::trip::Trip;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartEntry};
use crate::holds::HoldBook;
use crate::payment::PaymentDesk;
use crate::reservations::ReservationLedger;
use crate::session::BookingSession;
use crate::trip::TripSequencer;

/// Minimal durable record of one session: every hold, reservation, trip and
/// intent with its ids, status, and deadlines. Enough to resume after a
/// restart without re-deriving state from the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub context: SessionContext,
    pub holds: Vec<Hold>,
    pub converted_hold_ids: Vec<Uuid>,
    #[serde(default)]
    pub expired_hold_ids: Vec<Uuid>,
    pub reservations: Vec<Reservation>,
    pub cart_entries: Vec<CartEntry>,
    pub trip: Option<Trip>,
    pub intents: Vec<PaymentIntent>,
}

impl SessionSnapshot {
    pub fn capture(session: &BookingSession) -> Self {
        Self {
            context: session.context.clone(),
            holds: session.holds.iter().cloned().collect(),
            converted_hold_ids: session.holds.converted_ids().copied().collect(),
            expired_hold_ids: session.holds.expired_ids().copied().collect(),
            reservations: session.ledger.iter().cloned().collect(),
            cart_entries: session.cart.entries().to_vec(),
            trip: session.trip.current().cloned(),
            intents: session.desk.iter().cloned().collect(),
        }
    }

    pub fn into_session(self) -> BookingSession {
        BookingSession {
            context: self.context,
            holds: HoldBook::from_parts(self.holds, self.converted_hold_ids, self.expired_hold_ids),
            ledger: ReservationLedger::from_parts(self.reservations),
            cart: Cart::from_parts(self.cart_entries),
            trip: TripSequencer::from_parts(self.trip),
            desk: PaymentDesk::from_parts(self.intents),
        }
    }
}
