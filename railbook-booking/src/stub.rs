use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use railbook_core::clock::Clock;
use railbook_core::gateway::{GatewayError, GatewayOrder, GatewayOutcome, PaymentGateway};
use railbook_core::supplier::{SeatSupplier, SupplierError};
use railbook_domain::leg::{
    ClassAvailability, LegRef, PassengerType, ScheduleOption, SeatClass,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scheduled departure in the stub timetable.
#[derive(Debug, Clone)]
pub struct ScheduleSeed {
    pub departure_station: String,
    pub arrival_station: String,
    pub date: NaiveDate,
    pub train_no: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub standard_fare_krw: i64,
    pub first_class_fare_krw: i64,
    pub seats_per_class: i32,
}

type SeatLockKey = (String, NaiveDate, String); // (train_no, date, seat id)

/// In-memory stand-in for the external seat/fare backend. Owns the
/// system-wide one-active-hold-per-seat rule the way the real inventory
/// service would: seat locks are keyed by train and date, shared across all
/// sessions pointed at the same instance.
pub struct InMemorySeatSupplier {
    schedule: Vec<ScheduleSeed>,
    locks: Mutex<HashMap<SeatLockKey, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
    /// Number of upcoming search calls to fail with a transport error.
    search_outages: AtomicUsize,
}

impl InMemorySeatSupplier {
    pub fn new(schedule: Vec<ScheduleSeed>, clock: Arc<dyn Clock>) -> Self {
        Self {
            schedule,
            locks: Mutex::new(HashMap::new()),
            clock,
            search_outages: AtomicUsize::new(0),
        }
    }

    /// Fixed Seoul/Busan timetable used by the demo binary and the tests.
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        let mut schedule = Vec::new();
        for date in [
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 17).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 18).unwrap(),
        ] {
            for (train_no, hour, dep, arr) in [
                ("K101", 7u32, "SEOUL", "BUSAN"),
                ("K105", 10, "SEOUL", "BUSAN"),
                ("K102", 8, "BUSAN", "SEOUL"),
                ("K106", 11, "BUSAN", "SEOUL"),
            ] {
                let departure_at = Utc
                    .from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap());
                schedule.push(ScheduleSeed {
                    departure_station: dep.to_string(),
                    arrival_station: arr.to_string(),
                    date,
                    train_no: train_no.to_string(),
                    departure_at,
                    arrival_at: departure_at + Duration::minutes(160),
                    standard_fare_krw: 59_800,
                    first_class_fare_krw: 83_700,
                    seats_per_class: 40,
                });
            }
        }
        Self::new(schedule, clock)
    }

    pub fn fail_next_searches(&self, count: usize) {
        self.search_outages.store(count, Ordering::SeqCst);
    }

    fn seed_for(&self, leg: &LegRef) -> Option<&ScheduleSeed> {
        self.schedule.iter().find(|s| {
            s.train_no == leg.train_no
                && s.date == leg.date
                && s.departure_station == leg.departure_station
                && s.arrival_station == leg.arrival_station
        })
    }

    fn active_locks_for(&self, train_no: &str, date: NaiveDate) -> i32 {
        let now = self.clock.now();
        let locks = self.locks.lock().expect("lock table poisoned");
        locks
            .iter()
            .filter(|((t, d, _), expiry)| t == train_no && *d == date && **expiry > now)
            .count() as i32
    }
}

#[async_trait]
impl SeatSupplier for InMemorySeatSupplier {
    async fn search(
        &self,
        leg: &LegRef,
        _passenger_count: u32,
    ) -> Result<Vec<ScheduleOption>, SupplierError> {
        if self
            .search_outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SupplierError::Transport("simulated outage".to_string()));
        }

        Ok(self
            .schedule
            .iter()
            .filter(|s| {
                s.date == leg.date
                    && s.departure_station == leg.departure_station
                    && s.arrival_station == leg.arrival_station
                    && (leg.train_no.is_empty() || s.train_no == leg.train_no)
            })
            .map(|s| {
                let held = self.active_locks_for(&s.train_no, s.date);
                ScheduleOption {
                    train_no: s.train_no.clone(),
                    departure_station: s.departure_station.clone(),
                    arrival_station: s.arrival_station.clone(),
                    departure_at: s.departure_at,
                    arrival_at: s.arrival_at,
                    availability: vec![
                        ClassAvailability {
                            class: SeatClass::Standard,
                            remaining_seats: (s.seats_per_class - held).max(0),
                            fare_krw: s.standard_fare_krw,
                        },
                        ClassAvailability {
                            class: SeatClass::FirstClass,
                            remaining_seats: s.seats_per_class,
                            fare_krw: s.first_class_fare_krw,
                        },
                    ],
                }
            })
            .collect())
    }

    async fn hold_seats(
        &self,
        leg: &LegRef,
        seat_ids: &[String],
        ttl: Duration,
    ) -> Result<(), SupplierError> {
        let seed = self
            .seed_for(leg)
            .ok_or_else(|| SupplierError::UnknownLeg(format!("{leg:?}")))?;
        let now = self.clock.now();
        let mut locks = self.locks.lock().expect("lock table poisoned");

        let taken: Vec<String> = seat_ids
            .iter()
            .filter(|seat| {
                locks
                    .get(&(seed.train_no.clone(), seed.date, (*seat).clone()))
                    .map(|expiry| *expiry > now)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(SupplierError::SeatsTaken { seat_ids: taken });
        }

        for seat in seat_ids {
            locks.insert(
                (seed.train_no.clone(), seed.date, seat.clone()),
                now + ttl,
            );
        }
        Ok(())
    }

    async fn release_seats(
        &self,
        leg: &LegRef,
        seat_ids: &[String],
    ) -> Result<(), SupplierError> {
        let seed = self
            .seed_for(leg)
            .ok_or_else(|| SupplierError::UnknownLeg(format!("{leg:?}")))?;
        let mut locks = self.locks.lock().expect("lock table poisoned");
        for seat in seat_ids {
            locks.remove(&(seed.train_no.clone(), seed.date, seat.clone()));
        }
        Ok(())
    }

    async fn quote_fare(
        &self,
        leg: &LegRef,
        passenger_types: &[PassengerType],
    ) -> Result<i64, SupplierError> {
        let seed = self
            .seed_for(leg)
            .ok_or_else(|| SupplierError::UnknownLeg(format!("{leg:?}")))?;
        Ok(passenger_types
            .iter()
            .map(|pt| match pt {
                PassengerType::Adult => seed.standard_fare_krw,
                PassengerType::Child => seed.standard_fare_krw / 2,
                PassengerType::Senior => seed.standard_fare_krw * 7 / 10,
            })
            .sum())
    }
}

/// Scripted stand-in for the third-party payment flow. Outcomes are queued
/// per upcoming execute call; the default is a successful payment.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<GatewayOutcome>>,
    prepared: Mutex<HashMap<String, i64>>,
    order_counter: AtomicU64,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            prepared: Mutex::new(HashMap::new()),
            order_counter: AtomicU64::new(1),
        }
    }

    /// Queue the outcome for the next execute call.
    pub fn script_outcome(&self, outcome: GatewayOutcome) {
        self.script.lock().expect("script poisoned").push_back(outcome);
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn prepare_order(&self, amount_krw: i64) -> Result<GatewayOrder, GatewayError> {
        let n = self.order_counter.fetch_add(1, Ordering::SeqCst);
        let order_id = format!("ord-{n:06}");
        self.prepared
            .lock()
            .expect("prepared poisoned")
            .insert(order_id.clone(), amount_krw);
        Ok(GatewayOrder {
            order_id,
            amount_krw,
        })
    }

    async fn execute_order(&self, order_id: &str) -> Result<GatewayOutcome, GatewayError> {
        if !self
            .prepared
            .lock()
            .expect("prepared poisoned")
            .contains_key(order_id)
        {
            return Err(GatewayError::Transport(format!(
                "unknown order: {order_id}"
            )));
        }
        let scripted = self.script.lock().expect("script poisoned").pop_front();
        Ok(scripted.unwrap_or(GatewayOutcome::Paid))
    }
}
