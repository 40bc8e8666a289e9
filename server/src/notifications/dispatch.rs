use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::mailer::{DeliveryError, Mailer};
use super::templates::TemplateKind;
use crate::worker::{NotificationTask, TaskHandler};

/// Turns queued notification tasks into emails.
pub struct MailNotificationHandler {
    mailer: Arc<dyn Mailer>,
}

impl MailNotificationHandler {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl TaskHandler for MailNotificationHandler {
    async fn handle(&self, task: NotificationTask) -> Result<(), DeliveryError> {
        let (template, data) = match &task {
            NotificationTask::TicketIssued(notice) => (
                TemplateKind::TicketConfirmation,
                json!({
                    "event_title": notice.event_title,
                    "ticket_code": notice.ticket_code,
                }),
            ),
            NotificationTask::TicketTransferred(notice) => (
                TemplateKind::TicketTransferred,
                json!({
                    "event_title": notice.event_title,
                    "ticket_code": notice.ticket_code,
                }),
            ),
            NotificationTask::EventReminder(notice) => (
                TemplateKind::EventReminder,
                json!({
                    "event_title": notice.event_title,
                    "name": notice.name,
                    "start_time": notice.start_time.format("%Y-%m-%d %H:%M UTC").to_string(),
                }),
            ),
            NotificationTask::EventCancelled(notice) => (
                TemplateKind::EventCancelled,
                json!({ "event_title": notice.event_title }),
            ),
            NotificationTask::EventUpdated(notice) => (
                TemplateKind::EventUpdated,
                json!({
                    "event_title": notice.event_title,
                    "start_time": notice.start_time.format("%Y-%m-%d %H:%M UTC").to_string(),
                }),
            ),
        };

        self.mailer.send(task.recipient(), template, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{ReminderNotice, TicketNotice};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, TemplateKind, Value)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(
            &self,
            address: &str,
            template: TemplateKind,
            data: &Value,
        ) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), template, data.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_each_task_maps_to_its_template() {
        let mailer = Arc::new(RecordingMailer::default());
        let handler = MailNotificationHandler::new(mailer.clone());

        handler
            .handle(NotificationTask::TicketTransferred(TicketNotice {
                email: "bob@example.com".to_string(),
                registration_id: Uuid::new_v4(),
                event_title: "Gig".to_string(),
                ticket_code: "E-0001-00000001".to_string(),
            }))
            .await
            .unwrap();
        handler
            .handle(NotificationTask::EventReminder(ReminderNotice {
                email: "ada@example.com".to_string(),
                name: "Ada".to_string(),
                registration_id: Uuid::new_v4(),
                event_title: "Gig".to_string(),
                start_time: Utc.with_ymd_and_hms(2030, 1, 2, 18, 30, 0).unwrap(),
            }))
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "bob@example.com");
        assert_eq!(sent[0].1, TemplateKind::TicketTransferred);
        assert_eq!(sent[0].2["ticket_code"], "E-0001-00000001");
        assert_eq!(sent[1].1, TemplateKind::EventReminder);
        assert_eq!(sent[1].2["start_time"], "2030-01-02 18:30 UTC");
    }
}
