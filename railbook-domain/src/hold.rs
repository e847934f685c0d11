use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leg::{LegRef, PassengerType};

/// A time-boxed claim on specific seats before payment (a.k.a. pending booking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub leg: LegRef,
    /// Ordered; index-aligned with `passenger_types`.
    pub seat_ids: Vec<String>,
    pub passenger_types: Vec<PassengerType>,
    pub created_at: DateTime<Utc>,
    pub ttl_expiry: DateTime<Utc>,
}

impl Hold {
    pub fn new(
        leg: LegRef,
        seat_ids: Vec<String>,
        passenger_types: Vec<PassengerType>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            leg,
            seat_ids,
            passenger_types,
            created_at,
            ttl_expiry: created_at + ttl,
        }
    }

    /// Remaining lifetime, clamped to zero. A zero value means the hold must
    /// be treated as gone by every caller, whether or not the expiry
    /// side effect has executed yet.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.ttl_expiry - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ttl_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leg() -> LegRef {
        LegRef {
            departure_station: "SEOUL".to_string(),
            arrival_station: "BUSAN".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            train_no: "K101".to_string(),
        }
    }

    #[test]
    fn test_time_remaining_clamped_to_zero() {
        let created = Utc::now();
        let hold = Hold::new(
            leg(),
            vec!["12A".to_string()],
            vec![PassengerType::Adult],
            created,
            Duration::minutes(10),
        );

        assert_eq!(hold.time_remaining(created), Duration::minutes(10));
        assert_eq!(
            hold.time_remaining(created + Duration::minutes(4)),
            Duration::minutes(6)
        );
        // Past expiry: never negative.
        assert_eq!(
            hold.time_remaining(created + Duration::minutes(11)),
            Duration::zero()
        );
        assert!(hold.is_expired(created + Duration::minutes(10)));
    }
}
