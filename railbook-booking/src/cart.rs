use chrono::{DateTime, Utc};
use railbook_core::{Reject, RejectResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reservations::ReservationLedger;

/// A reservation's membership in the cart, plus checkout-time selection
/// view state. Toggling never touches the reservation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
    pub reservation_id: Uuid,
    pub selected: bool,
    pub added_at: DateTime<Utc>,
}

/// What `checkout` found when re-validating the selection against live
/// reservation statuses. Stale entries are reported by id so the caller can
/// re-display the remainder instead of seeing a blanket error.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReport {
    pub ready: Vec<Uuid>,
    pub stale: Vec<Uuid>,
}

/// User-scoped aggregation of reservations awaiting a single checkout.
///
/// Every read goes back to the ledger for the latest statuses; counts and
/// totals are never cached across an await boundary.
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a reservation. Idempotent for reservations already present;
    /// rejected when the reservation is not payable.
    pub fn add(
        &mut self,
        reservation_id: Uuid,
        ledger: &ReservationLedger,
        now: DateTime<Utc>,
    ) -> RejectResult<()> {
        ledger.require(reservation_id)?;
        if !ledger.is_payable(reservation_id, now) {
            return Err(Reject::NotAwaitingPayment {
                reservation_ids: vec![reservation_id],
            });
        }
        if self
            .entries
            .iter()
            .any(|e| e.reservation_id == reservation_id)
        {
            return Ok(());
        }
        self.entries.push(CartEntry {
            reservation_id,
            selected: true,
            added_at: now,
        });
        Ok(())
    }

    pub fn remove(&mut self, reservation_ids: &[Uuid]) {
        self.entries
            .retain(|e| !reservation_ids.contains(&e.reservation_id));
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub fn toggle_selection(&mut self, reservation_id: Uuid) -> RejectResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.reservation_id == reservation_id)
            .ok_or_else(|| {
                Reject::InvalidRequest(format!("reservation not in cart: {reservation_id}"))
            })?;
        entry.selected = !entry.selected;
        Ok(())
    }

    /// Select everything if anything is deselected, otherwise deselect all.
    pub fn toggle_all(&mut self) {
        let all_selected = self.entries.iter().all(|e| e.selected);
        for entry in &mut self.entries {
            entry.selected = !all_selected;
        }
    }

    /// The cart's effective view: entries whose reservation is still
    /// AWAITING_PAYMENT right now. Read-time filter; expired entries stay
    /// physically present until a checkout or an explicit remove drops them.
    pub fn live_entries(&self, ledger: &ReservationLedger, now: DateTime<Utc>) -> Vec<CartEntry> {
        self.entries
            .iter()
            .filter(|e| ledger.is_payable(e.reservation_id, now))
            .cloned()
            .collect()
    }

    pub fn live_count(&self, ledger: &ReservationLedger, now: DateTime<Utc>) -> usize {
        self.live_entries(ledger, now).len()
    }

    /// Sum of fares over live selected entries, recomputed on every read.
    pub fn selected_total(&self, ledger: &ReservationLedger, now: DateTime<Utc>) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.selected && ledger.is_payable(e.reservation_id, now))
            .filter_map(|e| ledger.get(e.reservation_id))
            .map(|r| r.fare_krw)
            .sum()
    }

    /// Re-validate the selected set against live statuses. Stale entries are
    /// dropped from the cart and listed in the report; `ready` carries the
    /// ids fit to hand to payment prepare.
    pub fn checkout(
        &mut self,
        ledger: &ReservationLedger,
        now: DateTime<Utc>,
    ) -> RejectResult<CheckoutReport> {
        let selected: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.reservation_id)
            .collect();
        if selected.is_empty() {
            return Err(Reject::InvalidRequest(
                "no cart entries selected for checkout".to_string(),
            ));
        }

        let (ready, stale): (Vec<Uuid>, Vec<Uuid>) = selected
            .into_iter()
            .partition(|id| ledger.is_payable(*id, now));

        if !stale.is_empty() {
            self.remove(&stale);
        }
        Ok(CheckoutReport { ready, stale })
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn from_parts(entries: Vec<CartEntry>) -> Self {
        Self { entries }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use railbook_domain::hold::Hold;
    use railbook_domain::leg::{LegRef, PassengerType};
    use railbook_domain::reservation::Reservation;

    fn leg() -> LegRef {
        LegRef {
            departure_station: "SEOUL".to_string(),
            arrival_station: "BUSAN".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            train_no: "K101".to_string(),
        }
    }

    fn reservation(
        ledger: &mut ReservationLedger,
        fare: i64,
        now: DateTime<Utc>,
        deadline_minutes: i64,
    ) -> Reservation {
        let hold = Hold::new(
            leg(),
            vec!["3-12A".to_string()],
            vec![PassengerType::Adult],
            now,
            Duration::minutes(10),
        );
        ledger.create_from_hold(&hold, fare, now + Duration::minutes(deadline_minutes), now)
    }

    #[test]
    fn test_selected_total_tracks_toggles_and_removal() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let r1 = reservation(&mut ledger, 59_800, now, 10);
        let r2 = reservation(&mut ledger, 41_900, now, 10);
        cart.add(r1.id, &ledger, now).unwrap();
        cart.add(r2.id, &ledger, now).unwrap();

        assert_eq!(cart.selected_total(&ledger, now), 101_700);

        cart.toggle_selection(r2.id).unwrap();
        assert_eq!(cart.selected_total(&ledger, now), 59_800);

        cart.toggle_all();
        assert_eq!(cart.selected_total(&ledger, now), 101_700);

        // Removing an item mid-selection keeps the total consistent.
        cart.remove(&[r1.id]);
        assert_eq!(cart.selected_total(&ledger, now), 41_900);

        cart.remove_all();
        assert_eq!(cart.selected_total(&ledger, now), 0);
    }

    #[test]
    fn test_add_rejects_non_payable() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let r = reservation(&mut ledger, 59_800, now, 10);
        ledger.mark_paid(r.id, now).unwrap();

        let err = cart.add(r.id, &ledger, now).unwrap_err();
        assert_eq!(err.reason_code(), "NOT_AWAITING_PAYMENT");
    }

    #[test]
    fn test_add_is_idempotent() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let r = reservation(&mut ledger, 59_800, now, 10);
        cart.add(r.id, &ledger, now).unwrap();
        cart.add(r.id, &ledger, now).unwrap();
        assert_eq!(cart.entries().len(), 1);
    }

    #[test]
    fn test_expired_entry_filtered_from_view_and_total() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let short = reservation(&mut ledger, 59_800, now, 5);
        let long = reservation(&mut ledger, 41_900, now, 60);
        cart.add(short.id, &ledger, now).unwrap();
        cart.add(long.id, &ledger, now).unwrap();

        let later = now + Duration::minutes(6);
        assert_eq!(cart.live_count(&ledger, later), 1);
        assert_eq!(cart.selected_total(&ledger, later), 41_900);
        // The entry is still physically present.
        assert_eq!(cart.entries().len(), 2);
    }

    #[test]
    fn test_checkout_reports_stale_entries() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let short = reservation(&mut ledger, 59_800, now, 5);
        let long = reservation(&mut ledger, 41_900, now, 60);
        cart.add(short.id, &ledger, now).unwrap();
        cart.add(long.id, &ledger, now).unwrap();

        let later = now + Duration::minutes(6);
        let report = cart.checkout(&ledger, later).unwrap();
        assert_eq!(report.ready, vec![long.id]);
        assert_eq!(report.stale, vec![short.id]);
        // Stale entry physically dropped after checkout reported it.
        assert_eq!(cart.entries().len(), 1);
    }

    #[test]
    fn test_checkout_with_nothing_selected_rejected() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let r = reservation(&mut ledger, 59_800, now, 10);
        cart.add(r.id, &ledger, now).unwrap();
        cart.toggle_selection(r.id).unwrap();

        let err = cart.checkout(&ledger, now).unwrap_err();
        assert_eq!(err.reason_code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_checkout_only_targets_selected() {
        let now = Utc::now();
        let mut ledger = ReservationLedger::new();
        let mut cart = Cart::new();

        let r1 = reservation(&mut ledger, 59_800, now, 10);
        let r2 = reservation(&mut ledger, 41_900, now, 10);
        cart.add(r1.id, &ledger, now).unwrap();
        cart.add(r2.id, &ledger, now).unwrap();
        cart.toggle_selection(r2.id).unwrap();

        let report = cart.checkout(&ledger, now).unwrap();
        assert_eq!(report.ready, vec![r1.id]);
        assert!(report.stale.is_empty());
    }
}
