use chrono::{DateTime, Utc};
use railbook_core::{Reject, RejectResult};
use railbook_domain::payment::{IntentOutcome, PaymentIntent};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::reservations::ReservationLedger;

/// Tracks payment intents and the one-pending-intent-per-reservation rule.
///
/// Validation and state transitions live here; actually driving the external
/// gateway is the session engine's job. Splitting it this way keeps every
/// status check synchronous and re-runnable at the moment of the
/// state-changing call, which is what the revalidation rules demand.
pub struct PaymentDesk {
    intents: HashMap<Uuid, PaymentIntent>,
    /// reservation id -> pending intent id
    in_flight: HashMap<Uuid, Uuid>,
}

impl PaymentDesk {
    pub fn new() -> Self {
        Self {
            intents: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Prepare-time validation: every target must be AWAITING_PAYMENT right
    /// now and free of pending intents. Fails wholesale, listing the ids that
    /// blocked it, so the caller can decide whether to retry with the rest.
    /// Returns the recomputed amount (the sum of the immutable fares).
    pub fn validate_targets(
        &self,
        ledger: &ReservationLedger,
        reservation_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> RejectResult<i64> {
        if reservation_ids.is_empty() {
            return Err(Reject::InvalidRequest(
                "payment targets must be non-empty".to_string(),
            ));
        }
        let unique: HashSet<Uuid> = reservation_ids.iter().copied().collect();
        if unique.len() != reservation_ids.len() {
            return Err(Reject::InvalidRequest(
                "duplicate payment targets".to_string(),
            ));
        }

        let stale: Vec<Uuid> = reservation_ids
            .iter()
            .copied()
            .filter(|id| !ledger.is_payable(*id, now))
            .collect();
        if !stale.is_empty() {
            return Err(Reject::NotAwaitingPayment {
                reservation_ids: stale,
            });
        }

        let busy: Vec<Uuid> = reservation_ids
            .iter()
            .copied()
            .filter(|id| self.in_flight.contains_key(id))
            .collect();
        if !busy.is_empty() {
            return Err(Reject::IntentInProgress {
                reservation_ids: busy,
            });
        }

        let amount = reservation_ids
            .iter()
            .filter_map(|id| ledger.get(*id))
            .map(|r| r.fare_krw)
            .sum();
        Ok(amount)
    }

    /// Record a gateway-acknowledged intent and claim its targets.
    pub fn register(
        &mut self,
        order_id: String,
        target_reservation_ids: Vec<Uuid>,
        amount_krw: i64,
        now: DateTime<Utc>,
    ) -> PaymentIntent {
        let intent = PaymentIntent {
            id: Uuid::new_v4(),
            order_id,
            target_reservation_ids,
            amount_krw,
            outcome: IntentOutcome::Pending,
            created_at: now,
        };
        for rid in &intent.target_reservation_ids {
            self.in_flight.insert(*rid, intent.id);
        }
        self.intents.insert(intent.id, intent.clone());
        intent
    }

    pub fn get(&self, intent_id: Uuid) -> RejectResult<&PaymentIntent> {
        self.intents
            .get(&intent_id)
            .ok_or_else(|| Reject::InvalidRequest(format!("unknown payment intent: {intent_id}")))
    }

    /// Execute-time revalidation, fail closed: if any target expired while
    /// the intent sat pending, the intent is discarded before the gateway is
    /// ever contacted — never silently charge for fewer or expired items.
    /// Also re-checks amount integrity against the immutable fares.
    pub fn revalidate_for_execute(
        &mut self,
        ledger: &ReservationLedger,
        intent_id: Uuid,
        now: DateTime<Utc>,
    ) -> RejectResult<PaymentIntent> {
        let intent = self.get(intent_id)?.clone();
        if !intent.is_pending() {
            return Err(Reject::InvalidRequest(format!(
                "payment intent already resolved: {intent_id}"
            )));
        }

        let stale: Vec<Uuid> = intent
            .target_reservation_ids
            .iter()
            .copied()
            .filter(|id| !ledger.is_payable(*id, now))
            .collect();
        if !stale.is_empty() {
            self.resolve(intent_id, IntentOutcome::Discarded);
            return Err(Reject::NotAwaitingPayment {
                reservation_ids: stale,
            });
        }

        let live_amount: i64 = intent
            .target_reservation_ids
            .iter()
            .filter_map(|id| ledger.get(*id))
            .map(|r| r.fare_krw)
            .sum();
        if live_amount != intent.amount_krw {
            self.resolve(intent_id, IntentOutcome::Discarded);
            return Err(Reject::StateCorruption(format!(
                "intent {intent_id} amount {} diverged from target fares {}",
                intent.amount_krw, live_amount
            )));
        }

        Ok(intent)
    }

    /// Terminal transition. Every outcome, including USER_CANCELLED and
    /// FAILED, frees the targets for a fresh prepare.
    pub fn resolve(&mut self, intent_id: Uuid, outcome: IntentOutcome) {
        if let Some(intent) = self.intents.get_mut(&intent_id) {
            for rid in &intent.target_reservation_ids {
                if self.in_flight.get(rid) == Some(&intent_id) {
                    self.in_flight.remove(rid);
                }
            }
            intent.outcome = outcome;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentIntent> {
        self.intents.values()
    }

    pub fn from_parts(intents: Vec<PaymentIntent>) -> Self {
        let in_flight = intents
            .iter()
            .filter(|i| i.is_pending())
            .flat_map(|i| i.target_reservation_ids.iter().map(move |r| (*r, i.id)))
            .collect();
        Self {
            intents: intents.into_iter().map(|i| (i.id, i)).collect(),
            in_flight,
        }
    }
}

impl Default for PaymentDesk {
    fn default() -> Self {
        Self::new()
    }
}
