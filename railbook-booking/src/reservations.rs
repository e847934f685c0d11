use chrono::{DateTime, Utc};
use railbook_core::{Reject, RejectResult};
use railbook_domain::hold::Hold;
use railbook_domain::leg::LegRef;
use railbook_domain::reservation::{Reservation, ReservationStatus, SeatAssignment};
use std::collections::HashMap;
use uuid::Uuid;

/// All reservations belonging to one session, terminal states included.
/// Records are never deleted; seats return to inventory on transition out of
/// AWAITING_PAYMENT, but the record stays for snapshots and audit.
pub struct ReservationLedger {
    reservations: HashMap<Uuid, Reservation>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self {
            reservations: HashMap::new(),
        }
    }

    /// Promote a consumed hold into a payable reservation with a fare frozen
    /// at this moment.
    pub fn create_from_hold(
        &mut self,
        hold: &Hold,
        fare_krw: i64,
        payment_deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Reservation {
        let seats = hold
            .seat_ids
            .iter()
            .zip(hold.passenger_types.iter())
            .map(|(seat_id, pt)| SeatAssignment::from_seat_id(seat_id, *pt))
            .collect();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            hold_id: hold.id,
            leg: hold.leg.clone(),
            fare_krw,
            seats,
            payment_deadline,
            status: ReservationStatus::AwaitingPayment,
            created_at: now,
        };
        self.reservations
            .insert(reservation.id, reservation.clone());
        reservation
    }

    pub fn get(&self, id: Uuid) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    pub fn require(&self, id: Uuid) -> RejectResult<&Reservation> {
        self.reservations
            .get(&id)
            .ok_or_else(|| Reject::InvalidRequest(format!("unknown reservation: {id}")))
    }

    /// Deadline-aware status, the only status read callers should use across
    /// await boundaries.
    pub fn effective_status(&self, id: Uuid, now: DateTime<Utc>) -> Option<ReservationStatus> {
        self.reservations.get(&id).map(|r| r.effective_status(now))
    }

    pub fn is_payable(&self, id: Uuid, now: DateTime<Utc>) -> bool {
        self.reservations
            .get(&id)
            .map(|r| r.is_payable(now))
            .unwrap_or(false)
    }

    /// Persist deadline expiry for any AWAITING_PAYMENT reservation past its
    /// deadline, returning (leg, seat ids) pairs whose seats must be released.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<(LegRef, Vec<String>)> {
        let mut released = Vec::new();
        for reservation in self.reservations.values_mut() {
            if reservation.status == ReservationStatus::AwaitingPayment
                && now >= reservation.payment_deadline
            {
                reservation.status = ReservationStatus::Expired;
                released.push((reservation.leg.clone(), seat_ids_of(reservation)));
            }
        }
        released
    }

    /// PAID is only reachable from AWAITING_PAYMENT. Anything else means the
    /// recorded history cannot have produced the observed state: a hard
    /// invariant violation, not a user-retryable condition.
    pub fn mark_paid(&mut self, id: Uuid, now: DateTime<Utc>) -> RejectResult<()> {
        let reservation = self
            .reservations
            .get_mut(&id)
            .ok_or_else(|| Reject::InvalidRequest(format!("unknown reservation: {id}")))?;
        if reservation.effective_status(now) != ReservationStatus::AwaitingPayment {
            return Err(Reject::StateCorruption(format!(
                "reservation {id} marked paid while {:?}",
                reservation.status
            )));
        }
        reservation.status = ReservationStatus::Paid;
        Ok(())
    }

    /// Record a gateway-confirmed payment. The money has already moved, so
    /// the record follows unconditionally, even when the payment deadline
    /// lapsed while the gateway call was in flight.
    pub fn settle_paid(&mut self, id: Uuid) {
        match self.reservations.get_mut(&id) {
            Some(reservation) => {
                if reservation.status != ReservationStatus::AwaitingPayment {
                    tracing::warn!(
                        reservation_id = %id,
                        status = ?reservation.status,
                        "recording confirmed payment on non-pending reservation"
                    );
                }
                reservation.status = ReservationStatus::Paid;
            }
            None => {
                tracing::warn!(reservation_id = %id, "confirmed payment for unknown reservation");
            }
        }
    }

    /// Explicit cancel. Returns the seats to release when the reservation was
    /// still payable; cancelling an already-terminal reservation is a no-op
    /// success, mirroring hold-cancel idempotency.
    pub fn cancel(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RejectResult<Option<(LegRef, Vec<String>)>> {
        let reservation = self
            .reservations
            .get_mut(&id)
            .ok_or_else(|| Reject::InvalidRequest(format!("unknown reservation: {id}")))?;
        if reservation.effective_status(now) != ReservationStatus::AwaitingPayment {
            return Ok(None);
        }
        reservation.status = ReservationStatus::Cancelled;
        Ok(Some((reservation.leg.clone(), seat_ids_of(reservation))))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    pub fn from_parts(reservations: Vec<Reservation>) -> Self {
        Self {
            reservations: reservations.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn seat_ids_of(reservation: &Reservation) -> Vec<String> {
    reservation.seats.iter().map(|s| s.seat_id()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use railbook_domain::leg::PassengerType;

    fn make_hold(now: DateTime<Utc>) -> Hold {
        Hold::new(
            LegRef {
                departure_station: "SEOUL".to_string(),
                arrival_station: "BUSAN".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
                train_no: "K101".to_string(),
            },
            vec!["3-12A".to_string(), "3-12B".to_string()],
            vec![PassengerType::Adult, PassengerType::Child],
            now,
            Duration::minutes(10),
        )
    }

    #[test]
    fn test_fare_frozen_at_conversion() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let hold = make_hold(now);

        let r = ledger.create_from_hold(&hold, 89_700, now + Duration::minutes(10), now);
        assert_eq!(r.fare_krw, 89_700);
        assert_eq!(r.hold_id, hold.id);
        assert_eq!(r.seats.len(), 2);
        assert_eq!(r.seats[0].car, "3");
        assert_eq!(r.seats[1].passenger_type, PassengerType::Child);
        assert_eq!(r.status, ReservationStatus::AwaitingPayment);
    }

    #[test]
    fn test_deadline_sweep_releases_seats() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let hold = make_hold(now);
        let r = ledger.create_from_hold(&hold, 89_700, now + Duration::minutes(10), now);

        assert!(ledger.sweep_expired(now).is_empty());

        let released = ledger.sweep_expired(now + Duration::minutes(11));
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].1, vec!["3-12A".to_string(), "3-12B".to_string()]);
        assert_eq!(
            ledger.effective_status(r.id, now + Duration::minutes(11)),
            Some(ReservationStatus::Expired)
        );
    }

    #[test]
    fn test_mark_paid_guards_history() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let hold = make_hold(now);
        let r = ledger.create_from_hold(&hold, 89_700, now + Duration::minutes(10), now);

        ledger.mark_paid(r.id, now).unwrap();
        // Paying twice is a state-corruption signal, not a rejection code
        // users can act on.
        let err = ledger.mark_paid(r.id, now).unwrap_err();
        assert_eq!(err.reason_code(), "STATE_CORRUPTION");
    }

    #[test]
    fn test_cancel_idempotent_and_releases_once() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let hold = make_hold(now);
        let r = ledger.create_from_hold(&hold, 89_700, now + Duration::minutes(10), now);

        let released = ledger.cancel(r.id, now).unwrap();
        assert!(released.is_some());
        // Second cancel: no-op, nothing released twice.
        assert!(ledger.cancel(r.id, now).unwrap().is_none());
        assert_eq!(
            ledger.effective_status(r.id, now),
            Some(ReservationStatus::Cancelled)
        );
    }
}
