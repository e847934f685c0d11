pub mod hold;
pub mod leg;
pub mod payment;
pub mod reservation;
pub mod trip;
