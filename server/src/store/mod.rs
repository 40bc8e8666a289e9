//! Transactional storage for events, tiers and registrations.
//!
//! The reservation engine only ever talks to [`CapacityStore`] and the
//! [`StoreTransaction`] it hands out. A transaction holds every row lock it
//! acquired until it is committed or dropped; dropping without
//! [`StoreTransaction::commit`] rolls back every staged write.
//!
//! Lock order across the crate is Registration, then Event, then Tier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Attendee, AuditEntry, Event, Registration, RegistrationSummary, TicketArtifact, TicketTier,
    User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Constraint violated: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Non-transactional reads plus the entry point for transactions.
#[async_trait]
pub trait CapacityStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn list_tiers(&self, event_id: Uuid) -> StoreResult<Vec<TicketTier>>;

    async fn registrations_for_user(&self, user_id: Uuid)
        -> StoreResult<Vec<RegistrationSummary>>;

    async fn find_registration(&self, id: Uuid) -> StoreResult<Option<Registration>>;

    async fn find_artifact_by_code(&self, code: &str) -> StoreResult<Option<TicketArtifact>>;

    /// Users holding a `confirmed` registration for the event.
    async fn confirmed_attendees(&self, event_id: Uuid) -> StoreResult<Vec<Attendee>>;

    /// Published events starting in `(after, until]` whose reminder has not
    /// been sent.
    async fn events_due_for_reminder(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>>;

    async fn mark_reminder_sent(&self, event_id: Uuid) -> StoreResult<()>;
}

/// A unit of work against the store.
///
/// `lock_*` methods take an exclusive row lock that is held for the life of
/// the transaction. Writes are only visible to other callers after
/// [`commit`](StoreTransaction::commit).
#[async_trait]
pub trait StoreTransaction: Send {
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<Event>>;

    /// Lock a tier, but only if it belongs to `event_id`.
    async fn lock_tier(&mut self, event_id: Uuid, tier_id: Uuid)
        -> StoreResult<Option<TicketTier>>;

    async fn lock_registration(&mut self, id: Uuid) -> StoreResult<Option<Registration>>;

    /// Read an event without locking it.
    async fn load_event(&mut self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn load_tier(&mut self, id: Uuid) -> StoreResult<Option<TicketTier>>;

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()>;

    async fn insert_tier(&mut self, tier: &TicketTier) -> StoreResult<()>;

    /// Write back every mutable column of a locked event.
    async fn save_event(&mut self, event: &Event) -> StoreResult<()>;

    async fn save_tier(&mut self, tier: &TicketTier) -> StoreResult<()>;

    async fn insert_registration(&mut self, registration: &Registration) -> StoreResult<()>;

    async fn save_registration(&mut self, registration: &Registration) -> StoreResult<()>;

    async fn insert_artifact(&mut self, artifact: &TicketArtifact) -> StoreResult<()>;

    async fn delete_artifact(&mut self, registration_id: Uuid) -> StoreResult<()>;

    /// Whether a live ticket already carries `code`, as seen by this
    /// transaction.
    async fn ticket_code_taken(&mut self, code: &str) -> StoreResult<bool>;

    async fn append_audit(&mut self, entry: &AuditEntry) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;
}
