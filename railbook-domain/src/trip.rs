use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leg::LegRef;

/// Round-trip phase as an explicit tagged state, never inferred from which
/// ids happen to be present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripPhase {
    AwaitingOutbound,
    AwaitingInbound,
    Complete,
}

/// A round-trip pairing of an outbound and inbound reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub outbound_leg: LegRef,
    pub return_date: NaiveDate,
    pub outbound_hold: Option<Uuid>,
    pub inbound_hold: Option<Uuid>,
    pub outbound_reservation: Option<Uuid>,
    pub inbound_reservation: Option<Uuid>,
    pub phase: TripPhase,
}

impl Trip {
    pub fn new(outbound_leg: LegRef, return_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbound_leg,
            return_date,
            outbound_hold: None,
            inbound_hold: None,
            outbound_reservation: None,
            inbound_reservation: None,
            phase: TripPhase::AwaitingOutbound,
        }
    }

    /// The inbound station pair is always the outbound pair swapped.
    pub fn inbound_leg(&self) -> LegRef {
        self.outbound_leg.swapped(self.return_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trip_awaits_outbound() {
        let leg = LegRef {
            departure_station: "SEOUL".to_string(),
            arrival_station: "BUSAN".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            train_no: "K101".to_string(),
        };
        let trip = Trip::new(leg, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());

        assert_eq!(trip.phase, TripPhase::AwaitingOutbound);
        assert_eq!(trip.inbound_leg().departure_station, "BUSAN");
        assert_eq!(trip.inbound_leg().arrival_station, "SEOUL");
    }
}
