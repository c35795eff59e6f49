pub mod booking;
pub mod notify;
pub mod reservation;
