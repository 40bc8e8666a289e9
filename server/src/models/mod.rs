pub mod audit;
pub mod event;
pub mod registration;
pub mod ticket;
pub mod user;

pub use audit::AuditEntry;
pub use event::{
    Availability, Event, EventDetails, EventStatus, EventUpdate, NewEvent, TierAvailability,
};
pub use registration::{
    Registration, RegistrationStatus, RegistrationSummary, TicketVerification,
};
pub use ticket::{NewTier, TicketArtifact, TicketTier, TierUpdate};
pub use user::{Attendee, User};
