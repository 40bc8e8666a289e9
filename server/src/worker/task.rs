use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Confirmation,
    Reminder,
    Cancellation,
    Update,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Confirmation => "confirmation",
            TaskKind::Reminder => "reminder",
            TaskKind::Cancellation => "cancellation",
            TaskKind::Update => "update",
        }
    }
}

/// A ticket that now belongs to `email`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketNotice {
    pub email: String,
    pub registration_id: Uuid,
    pub event_title: String,
    pub ticket_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderNotice {
    pub email: String,
    pub name: String,
    pub registration_id: Uuid,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancellationNotice {
    pub email: String,
    pub registration_id: Uuid,
    pub event_title: String,
}

/// The event's title or start time changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateNotice {
    pub email: String,
    pub registration_id: Uuid,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
}

/// One unit of background work.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationTask {
    TicketIssued(TicketNotice),
    TicketTransferred(TicketNotice),
    EventReminder(ReminderNotice),
    EventCancelled(CancellationNotice),
    EventUpdated(UpdateNotice),
}

impl NotificationTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            NotificationTask::TicketIssued(_) => TaskKind::Confirmation,
            NotificationTask::TicketTransferred(_) => TaskKind::Update,
            NotificationTask::EventReminder(_) => TaskKind::Reminder,
            NotificationTask::EventCancelled(_) => TaskKind::Cancellation,
            NotificationTask::EventUpdated(_) => TaskKind::Update,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            NotificationTask::TicketIssued(notice) | NotificationTask::TicketTransferred(notice) => {
                &notice.email
            }
            NotificationTask::EventReminder(notice) => &notice.email,
            NotificationTask::EventCancelled(notice) => &notice.email,
            NotificationTask::EventUpdated(notice) => &notice.email,
        }
    }
}
