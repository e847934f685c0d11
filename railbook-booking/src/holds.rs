use chrono::{DateTime, Duration, Utc};
use railbook_core::{Reject, RejectResult};
use railbook_domain::hold::Hold;
use railbook_domain::leg::PassengerType;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Manages the active-hold set for one session.
///
/// Holds leave the book exactly three ways: explicit cancel, TTL expiry
/// (swept), or consumption by conversion. Converted and expired hold ids are
/// remembered forever so a later conversion attempt is distinguishable from
/// an unknown hold.
pub struct HoldBook {
    holds: HashMap<Uuid, Hold>,
    converted: HashSet<Uuid>,
    expired: HashSet<Uuid>,
}

impl HoldBook {
    pub fn new() -> Self {
        Self {
            holds: HashMap::new(),
            converted: HashSet::new(),
            expired: HashSet::new(),
        }
    }

    /// Fail-fast request validation, run before any supplier call.
    pub fn validate_request(
        seat_ids: &[String],
        passenger_types: &[PassengerType],
    ) -> RejectResult<()> {
        if seat_ids.is_empty() {
            return Err(Reject::InvalidRequest("seat set must be non-empty".to_string()));
        }
        if seat_ids.len() != passenger_types.len() {
            return Err(Reject::InvalidRequest(format!(
                "expected one passenger type per seat: {} seats, {} passenger types",
                seat_ids.len(),
                passenger_types.len()
            )));
        }
        let unique: HashSet<&String> = seat_ids.iter().collect();
        if unique.len() != seat_ids.len() {
            return Err(Reject::InvalidRequest("duplicate seat ids".to_string()));
        }
        Ok(())
    }

    pub fn insert(&mut self, hold: Hold) {
        self.holds.insert(hold.id, hold);
    }

    /// Resolve a hold id to an active hold, distinguishing consumed,
    /// unknown, and expired holds.
    pub fn active(&self, hold_id: Uuid, now: DateTime<Utc>) -> RejectResult<&Hold> {
        if self.converted.contains(&hold_id) {
            return Err(Reject::AlreadyConverted { hold_id });
        }
        // A swept hold is still this session's hold; it expired, it did not
        // vanish.
        if self.expired.contains(&hold_id) {
            return Err(Reject::HoldExpired { hold_id });
        }
        let hold = self
            .holds
            .get(&hold_id)
            .ok_or(Reject::HoldNotFound { hold_id })?;
        if hold.is_expired(now) {
            return Err(Reject::HoldExpired { hold_id });
        }
        Ok(hold)
    }

    /// Derived remaining lifetime, clamped to zero. Known-but-expired holds
    /// report zero rather than an error; the id must still resolve.
    pub fn time_remaining(&self, hold_id: Uuid, now: DateTime<Utc>) -> RejectResult<Duration> {
        if self.converted.contains(&hold_id) {
            return Err(Reject::AlreadyConverted { hold_id });
        }
        if self.expired.contains(&hold_id) {
            return Ok(Duration::zero());
        }
        let hold = self
            .holds
            .get(&hold_id)
            .ok_or(Reject::HoldNotFound { hold_id })?;
        Ok(hold.time_remaining(now))
    }

    /// Consume a hold for conversion. One-way and one-time: the hold leaves
    /// the active set and its id joins the converted set in one step.
    pub fn take_for_conversion(&mut self, hold_id: Uuid, now: DateTime<Utc>) -> RejectResult<Hold> {
        self.active(hold_id, now)?;
        let hold = self
            .holds
            .remove(&hold_id)
            .ok_or(Reject::HoldNotFound { hold_id })?;
        self.converted.insert(hold_id);
        Ok(hold)
    }

    /// Idempotent cancel. Returns the hold if it was still present so the
    /// caller can release its seats; unknown, expired-and-swept, or
    /// converted ids are a no-op success.
    pub fn cancel(&mut self, hold_id: Uuid) -> Option<Hold> {
        self.holds.remove(&hold_id)
    }

    /// Remove holds past their TTL, returning them for seat release. Their
    /// ids stay known so later lookups answer HOLD_EXPIRED, not not-found.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<Hold> {
        let expired_ids: Vec<Uuid> = self
            .holds
            .values()
            .filter(|h| h.is_expired(now))
            .map(|h| h.id)
            .collect();
        expired_ids
            .into_iter()
            .filter_map(|id| {
                self.expired.insert(id);
                self.holds.remove(&id)
            })
            .collect()
    }

    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.holds.values().filter(|h| !h.is_expired(now)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hold> {
        self.holds.values()
    }

    pub fn converted_ids(&self) -> impl Iterator<Item = &Uuid> {
        self.converted.iter()
    }

    pub fn expired_ids(&self) -> impl Iterator<Item = &Uuid> {
        self.expired.iter()
    }

    /// Rebuild from a snapshot.
    pub fn from_parts(holds: Vec<Hold>, converted: Vec<Uuid>, expired: Vec<Uuid>) -> Self {
        Self {
            holds: holds.into_iter().map(|h| (h.id, h)).collect(),
            converted: converted.into_iter().collect(),
            expired: expired.into_iter().collect(),
        }
    }
}

impl Default for HoldBook {
    fn default() -> Self {
        Self::new()
    }
}
