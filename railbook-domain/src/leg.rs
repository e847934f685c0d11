use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One directional segment of travel: a scheduled departure/arrival pair on a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegRef {
    pub departure_station: String,
    pub arrival_station: String,
    pub date: NaiveDate,
    pub train_no: String,
}

impl LegRef {
    /// Derive the return leg by exchanging departure and arrival stations.
    /// The train number is cleared since the return service is chosen by a
    /// fresh search on the swapped pair.
    pub fn swapped(&self, return_date: NaiveDate) -> LegRef {
        LegRef {
            departure_station: self.arrival_station.clone(),
            arrival_station: self.departure_station.clone(),
            date: return_date,
            train_no: String::new(),
        }
    }

    /// Station pair only, ignoring date and train. Used to check that an
    /// inbound leg really is the mirror of the outbound one.
    pub fn same_pair_reversed(&self, other: &LegRef) -> bool {
        self.departure_station == other.arrival_station
            && self.arrival_station == other.departure_station
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerType {
    Adult,
    Child,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    Standard,
    FirstClass,
}

/// Per-class availability and price inside a search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassAvailability {
    pub class: SeatClass,
    pub remaining_seats: i32,
    pub fare_krw: i64,
}

/// One departure option returned by the seat/fare supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOption {
    pub train_no: String,
    pub departure_station: String,
    pub arrival_station: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub availability: Vec<ClassAvailability>,
}
