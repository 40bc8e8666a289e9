pub mod reminders;
pub mod reservation;

pub use reminders::{ReminderRun, ReminderScanner};
pub use reservation::{IssuedTicket, ReservationEngine};
