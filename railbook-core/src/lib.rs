pub mod clock;
pub mod error;
pub mod gateway;
pub mod session;
pub mod supplier;

pub use error::{Reject, RejectResult};
