pub mod cart;
pub mod holds;
pub mod payment;
pub mod reservations;
pub mod session;
pub mod snapshot;
pub mod stub;
pub mod trip;

pub use cart::Cart;
pub use session::{BookingEngine, BookingRules, BookingSession, PaymentResolution};
pub use snapshot::SessionSnapshot;
