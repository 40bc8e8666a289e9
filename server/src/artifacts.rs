//! Ticket artifact rendering.
//!
//! Rendering runs inside the reservation transaction, so an error here rolls
//! the whole allocation or transfer back.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, TicketArtifact, TicketTier, User};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("QR payload could not be produced: {0}")]
    Qr(String),

    #[error("Ticket document could not be produced: {0}")]
    Document(String),
}

/// Everything a renderer needs to print a ticket for its current holder.
pub struct ArtifactRequest<'a> {
    pub registration_id: Uuid,
    pub event: &'a Event,
    pub tier: &'a TicketTier,
    pub holder: &'a User,
}

pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, request: &ArtifactRequest<'_>) -> Result<TicketArtifact, ArtifactError>;
}

/// Short code printed on the ticket, e.g. `E-3f9a-0c1d2e3f`.
pub fn new_ticket_code() -> String {
    let head = Uuid::new_v4().simple().to_string();
    let tail = Uuid::new_v4().simple().to_string();
    format!("E-{}-{}", &head[..4], &tail[..8])
}

/// Produces verification links instead of image and PDF bytes.
///
/// The QR payload is the verification URL for the code; the document is the
/// path the ticket PDF is served from once an external renderer writes it.
pub struct LinkRenderer {
    verify_base_url: String,
}

impl LinkRenderer {
    pub fn new(verify_base_url: impl Into<String>) -> Self {
        Self {
            verify_base_url: verify_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ArtifactRenderer for LinkRenderer {
    fn render(&self, request: &ArtifactRequest<'_>) -> Result<TicketArtifact, ArtifactError> {
        let ticket_code = new_ticket_code();
        tracing::debug!(
            registration_id = %request.registration_id,
            event = %request.event.title,
            tier = %request.tier.name,
            holder = %request.holder.email,
            "Rendering ticket artifact"
        );

        Ok(TicketArtifact {
            id: Uuid::new_v4(),
            registration_id: request.registration_id,
            qr_payload: format!("{}/{}", self.verify_base_url, ticket_code),
            document_url: format!("/tickets/ticket_{ticket_code}.pdf"),
            ticket_code,
            created_at: Utc::now(),
        })
    }
}
