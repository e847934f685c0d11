use chrono::{DateTime, NaiveDate, Utc};
use railbook_core::{Reject, RejectResult};
use railbook_domain::hold::Hold;
use railbook_domain::leg::LegRef;
use railbook_domain::reservation::ReservationStatus;
use railbook_domain::trip::{Trip, TripPhase};
use uuid::Uuid;

use crate::holds::HoldBook;
use crate::reservations::ReservationLedger;

/// Sequences the two legs of a round trip.
///
/// The inbound leg is gated hard behind the outbound leg being secured: its
/// station pair is derived by swapping the outbound pair, so an early inbound
/// search would run against an undefined pair. If the outbound side dies
/// before the trip completes, the whole trip is abandoned and restarted.
pub struct TripSequencer {
    current: Option<Trip>,
}

impl TripSequencer {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Start (or restart) a round trip. Any prior trip is discarded.
    pub fn begin(
        &mut self,
        departure_station: String,
        arrival_station: String,
        outbound_date: NaiveDate,
        return_date: NaiveDate,
    ) -> RejectResult<Trip> {
        if return_date < outbound_date {
            return Err(Reject::InvalidRequest(
                "return date precedes outbound date".to_string(),
            ));
        }
        let outbound_leg = LegRef {
            departure_station,
            arrival_station,
            date: outbound_date,
            // Pinned later, when a hold is placed on a concrete departure.
            train_no: String::new(),
        };
        let trip = Trip::new(outbound_leg, return_date);
        self.current = Some(trip.clone());
        Ok(trip)
    }

    pub fn current(&self) -> Option<&Trip> {
        self.current.as_ref()
    }

    /// The swapped station pair for the inbound leg. Rejected unless the
    /// outbound leg has been secured.
    pub fn inbound_leg(&self) -> RejectResult<LegRef> {
        let trip = self.current.as_ref().ok_or(Reject::OutboundNotSecured)?;
        if trip.phase != TripPhase::AwaitingInbound {
            return Err(Reject::OutboundNotSecured);
        }
        Ok(trip.inbound_leg())
    }

    /// Fold a freshly created hold into the trip state. Outbound holds
    /// advance the phase; inbound holds are recorded for conversion matching.
    pub fn note_hold(&mut self, hold: &Hold) {
        let Some(trip) = self.current.as_mut() else {
            return;
        };
        match trip.phase {
            TripPhase::AwaitingOutbound => {
                if same_pair_and_date(&hold.leg, &trip.outbound_leg) {
                    trip.outbound_hold = Some(hold.id);
                    // Pin the train the customer actually chose.
                    trip.outbound_leg.train_no = hold.leg.train_no.clone();
                    trip.phase = TripPhase::AwaitingInbound;
                }
            }
            TripPhase::AwaitingInbound => {
                if same_pair_and_date(&hold.leg, &trip.inbound_leg()) {
                    trip.inbound_hold = Some(hold.id);
                }
            }
            TripPhase::Complete => {}
        }
    }

    /// Fold a hold-to-reservation conversion into the trip state. Converting
    /// the inbound hold completes the trip.
    pub fn note_conversion(&mut self, hold_id: Uuid, reservation_id: Uuid) {
        let Some(trip) = self.current.as_mut() else {
            return;
        };
        if trip.outbound_hold == Some(hold_id) {
            trip.outbound_reservation = Some(reservation_id);
        } else if trip.inbound_hold == Some(hold_id) {
            trip.inbound_reservation = Some(reservation_id);
            if trip.phase == TripPhase::AwaitingInbound {
                trip.phase = TripPhase::Complete;
            }
        }
    }

    /// Re-check that the outbound side is still alive. When it expired or
    /// was cancelled before the trip completed, the trip is abandoned: state
    /// resets to AWAITING_OUTBOUND on the same legs, and the caller gets the
    /// distinct trip-incomplete condition rather than a generic error.
    pub fn revalidate(
        &mut self,
        holds: &HoldBook,
        ledger: &ReservationLedger,
        now: DateTime<Utc>,
    ) -> RejectResult<()> {
        let Some(trip) = self.current.as_mut() else {
            return Ok(());
        };
        if trip.phase == TripPhase::AwaitingOutbound {
            return Ok(());
        }

        let outbound_alive = match trip.outbound_reservation {
            Some(rid) => matches!(
                ledger.effective_status(rid, now),
                Some(ReservationStatus::AwaitingPayment) | Some(ReservationStatus::Paid)
            ),
            None => match trip.outbound_hold {
                Some(hid) => holds.active(hid, now).is_ok(),
                None => false,
            },
        };
        // A paid trip is settled even if the payment deadline has long passed.
        if trip.phase == TripPhase::Complete {
            let inbound_alive = match trip.inbound_reservation {
                Some(rid) => matches!(
                    ledger.effective_status(rid, now),
                    Some(ReservationStatus::AwaitingPayment) | Some(ReservationStatus::Paid)
                ),
                None => false,
            };
            if outbound_alive && inbound_alive {
                return Ok(());
            }
        } else if outbound_alive {
            return Ok(());
        }

        let abandoned_id = trip.id;
        tracing::debug!(trip_id = %abandoned_id, "round trip abandoned, restarting from outbound");
        let restarted = Trip::new(
            LegRef {
                train_no: String::new(),
                ..trip.outbound_leg.clone()
            },
            trip.return_date,
        );
        self.current = Some(restarted);
        Err(Reject::TripIncomplete {
            trip_id: abandoned_id,
        })
    }

    /// Combined fare, defined only once both legs are secured.
    pub fn total_fare(&self, ledger: &ReservationLedger) -> RejectResult<i64> {
        let trip = self.current.as_ref().ok_or(Reject::OutboundNotSecured)?;
        if trip.phase != TripPhase::Complete {
            return Err(Reject::TripIncomplete { trip_id: trip.id });
        }
        let outbound = trip
            .outbound_reservation
            .and_then(|id| ledger.get(id))
            .ok_or_else(|| Reject::StateCorruption("complete trip missing outbound".to_string()))?;
        let inbound = trip
            .inbound_reservation
            .and_then(|id| ledger.get(id))
            .ok_or_else(|| Reject::StateCorruption("complete trip missing inbound".to_string()))?;
        Ok(outbound.fare_krw + inbound.fare_krw)
    }

    pub fn from_parts(current: Option<Trip>) -> Self {
        Self { current }
    }
}

impl Default for TripSequencer {
    fn default() -> Self {
        Self::new()
    }
}

fn same_pair_and_date(a: &LegRef, b: &LegRef) -> bool {
    a.departure_station == b.departure_station
        && a.arrival_station == b.arrival_station
        && a.date == b.date
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use railbook_domain::leg::PassengerType;

    fn outbound_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 16).unwrap()
    }

    fn return_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 18).unwrap()
    }

    fn begin(seq: &mut TripSequencer) -> Trip {
        seq.begin(
            "SEOUL".to_string(),
            "BUSAN".to_string(),
            outbound_date(),
            return_date(),
        )
        .unwrap()
    }

    fn make_hold(leg: LegRef, now: DateTime<Utc>) -> Hold {
        Hold::new(
            leg,
            vec!["3-12A".to_string()],
            vec![PassengerType::Adult],
            now,
            Duration::minutes(10),
        )
    }

    #[test]
    fn test_inbound_gated_until_outbound_secured() {
        let mut seq = TripSequencer::new();
        // No trip at all.
        assert_eq!(
            seq.inbound_leg().unwrap_err().reason_code(),
            "OUTBOUND_NOT_SECURED"
        );

        begin(&mut seq);
        // Trip begun but outbound not yet held.
        assert_eq!(
            seq.inbound_leg().unwrap_err().reason_code(),
            "OUTBOUND_NOT_SECURED"
        );
    }

    #[test]
    fn test_outbound_hold_unlocks_inbound_pair() {
        let now = Utc::now();
        let mut seq = TripSequencer::new();
        begin(&mut seq);

        let hold = make_hold(
            LegRef {
                departure_station: "SEOUL".to_string(),
                arrival_station: "BUSAN".to_string(),
                date: outbound_date(),
                train_no: "K101".to_string(),
            },
            now,
        );
        seq.note_hold(&hold);

        assert_eq!(seq.current().unwrap().phase, TripPhase::AwaitingInbound);
        let inbound = seq.inbound_leg().unwrap();
        assert_eq!(inbound.departure_station, "BUSAN");
        assert_eq!(inbound.arrival_station, "SEOUL");
        assert_eq!(inbound.date, return_date());
    }

    #[test]
    fn test_unrelated_hold_does_not_advance_phase() {
        let now = Utc::now();
        let mut seq = TripSequencer::new();
        begin(&mut seq);

        let hold = make_hold(
            LegRef {
                departure_station: "SEOUL".to_string(),
                arrival_station: "GWANGJU".to_string(),
                date: outbound_date(),
                train_no: "K301".to_string(),
            },
            now,
        );
        seq.note_hold(&hold);
        assert_eq!(seq.current().unwrap().phase, TripPhase::AwaitingOutbound);
    }

    #[test]
    fn test_full_round_trip_and_total_fare() {
        let now = Utc::now();
        let mut seq = TripSequencer::new();
        let mut holds = HoldBook::new();
        let mut ledger = ReservationLedger::new();
        begin(&mut seq);

        let out_hold = make_hold(
            LegRef {
                departure_station: "SEOUL".to_string(),
                arrival_station: "BUSAN".to_string(),
                date: outbound_date(),
                train_no: "K101".to_string(),
            },
            now,
        );
        holds.insert(out_hold.clone());
        seq.note_hold(&out_hold);

        let out_res =
            ledger.create_from_hold(&out_hold, 59_800, now + Duration::minutes(10), now);
        seq.note_conversion(out_hold.id, out_res.id);
        assert_eq!(seq.current().unwrap().phase, TripPhase::AwaitingInbound);

        // Total fare is undefined until the trip completes.
        assert_eq!(
            seq.total_fare(&ledger).unwrap_err().reason_code(),
            "TRIP_INCOMPLETE"
        );

        let in_hold = make_hold(seq.inbound_leg().unwrap(), now);
        holds.insert(in_hold.clone());
        seq.note_hold(&in_hold);
        let in_res = ledger.create_from_hold(&in_hold, 59_800, now + Duration::minutes(10), now);
        seq.note_conversion(in_hold.id, in_res.id);

        assert_eq!(seq.current().unwrap().phase, TripPhase::Complete);
        assert_eq!(seq.total_fare(&ledger).unwrap(), 119_600);
    }

    #[test]
    fn test_outbound_expiry_abandons_trip() {
        let now = Utc::now();
        let mut seq = TripSequencer::new();
        let mut holds = HoldBook::new();
        let ledger = ReservationLedger::new();
        begin(&mut seq);

        let out_hold = make_hold(
            LegRef {
                departure_station: "SEOUL".to_string(),
                arrival_station: "BUSAN".to_string(),
                date: outbound_date(),
                train_no: "K101".to_string(),
            },
            now,
        );
        holds.insert(out_hold.clone());
        seq.note_hold(&out_hold);
        let abandoned_id = seq.current().unwrap().id;

        // Outbound hold expires before the inbound leg is secured.
        let later = now + Duration::minutes(15);
        let err = seq.revalidate(&holds, &ledger, later).unwrap_err();
        assert_eq!(err.reason_code(), "TRIP_INCOMPLETE");
        assert_eq!(
            err,
            Reject::TripIncomplete {
                trip_id: abandoned_id
            }
        );

        // Restarted from scratch on the same legs.
        let trip = seq.current().unwrap();
        assert_eq!(trip.phase, TripPhase::AwaitingOutbound);
        assert!(trip.outbound_hold.is_none());
        assert_ne!(trip.id, abandoned_id);
    }

    #[test]
    fn test_return_before_outbound_rejected() {
        let mut seq = TripSequencer::new();
        let err = seq
            .begin(
                "SEOUL".to_string(),
                "BUSAN".to_string(),
                return_date(),
                outbound_date(),
            )
            .unwrap_err();
        assert_eq!(err.reason_code(), "INVALID_REQUEST");
    }
}
