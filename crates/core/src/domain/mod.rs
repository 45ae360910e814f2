pub mod field;
pub mod notification;
pub mod reservation;
