use serde_json::Value;

use super::mailer::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    TicketConfirmation,
    TicketTransferred,
    EventReminder,
    EventCancelled,
    EventUpdated,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::TicketConfirmation => "ticket_confirmation",
            TemplateKind::TicketTransferred => "ticket_transferred",
            TemplateKind::EventReminder => "event_reminder",
            TemplateKind::EventCancelled => "event_cancelled",
            TemplateKind::EventUpdated => "event_updated",
        }
    }
}

pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

const LAYOUT_OPEN: &str = "<!DOCTYPE html><html><body>\
<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;\">";

const LAYOUT_CLOSE: &str = "<p style=\"font-size: 0.8em; color: #666; text-align: center;\">\
Event Ticketing System</p></div></body></html>";

fn field<'a>(data: &'a Value, name: &str) -> Result<&'a str, DeliveryError> {
    data.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| DeliveryError::Template(format!("missing field `{name}`")))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render(kind: TemplateKind, data: &Value) -> Result<RenderedEmail, DeliveryError> {
    let event_title = field(data, "event_title")?;
    let title = escape(event_title);

    let (subject, content) = match kind {
        TemplateKind::TicketConfirmation => {
            let code = escape(field(data, "ticket_code")?);
            (
                format!("Your Ticket Confirmation - {event_title}"),
                format!(
                    "<h1>Ticket Confirmed!</h1>\
                     <p>Your registration for <strong>{title}</strong> has been confirmed.</p>\
                     <p style=\"font-size: 1.2em; font-weight: bold;\">{code}</p>\
                     <p>Please keep this code handy for entry.</p>"
                ),
            )
        }
        TemplateKind::TicketTransferred => {
            let code = escape(field(data, "ticket_code")?);
            (
                format!("A ticket was transferred to you - {event_title}"),
                format!(
                    "<h1>You have a ticket!</h1>\
                     <p>A ticket for <strong>{title}</strong> has been transferred to you.</p>\
                     <p style=\"font-size: 1.2em; font-weight: bold;\">{code}</p>"
                ),
            )
        }
        TemplateKind::EventReminder => {
            let start = escape(field(data, "start_time")?);
            (
                format!("Reminder: {event_title} starts soon"),
                format!(
                    "<h1>See you soon</h1>\
                     <p><strong>{title}</strong> starts at {start}.</p>"
                ),
            )
        }
        TemplateKind::EventCancelled => (
            format!("Event Cancelled: {event_title}"),
            format!(
                "<h1>Event cancelled</h1>\
                 <p>We are sorry, <strong>{title}</strong> has been cancelled.</p>"
            ),
        ),
        TemplateKind::EventUpdated => {
            let start = escape(field(data, "start_time")?);
            (
                format!("Event Update: {event_title}"),
                format!(
                    "<h1>Event updated</h1>\
                     <p>The details of <strong>{title}</strong> have changed.</p>\
                     <p>It now starts at {start}.</p>"
                ),
            )
        }
    };

    Ok(RenderedEmail {
        subject,
        body: format!("{LAYOUT_OPEN}{content}{LAYOUT_CLOSE}"),
    })
}
