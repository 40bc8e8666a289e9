//! Postgres-backed [`CapacityStore`].
//!
//! Row locks are `SELECT ... FOR UPDATE` inside a `sqlx` transaction. The
//! transaction rolls back when [`PgTransaction`] is dropped uncommitted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{CapacityStore, StoreResult, StoreTransaction};
use crate::models::{
    Attendee, AuditEntry, Event, EventStatus, Registration, RegistrationStatus,
    RegistrationSummary, TicketArtifact, TicketTier, User,
};

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, title, description, status, start_time, total_capacity, \
     remaining_capacity, reminder_sent, created_at, updated_at";

const TIER_COLUMNS: &str =
    "id, event_id, name, price, capacity, remaining_capacity, created_at, updated_at";

const REGISTRATION_COLUMNS: &str =
    "id, user_id, event_id, ticket_tier_id, status, created_at, updated_at";

const TICKET_COLUMNS: &str =
    "id, registration_id, ticket_code, qr_payload, document_url, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CapacityStore for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> StoreResult<PgTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn list_tiers(&self, event_id: Uuid) -> StoreResult<Vec<TicketTier>> {
        let query = format!(
            "SELECT {TIER_COLUMNS} FROM ticket_tiers WHERE event_id = $1 ORDER BY created_at, id"
        );
        let tiers = sqlx::query_as::<_, TicketTier>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tiers)
    }

    async fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<RegistrationSummary>> {
        let rows = sqlx::query_as::<_, RegistrationSummary>(
            "SELECT r.id, r.event_id, e.title AS event_title, e.start_time AS event_start_time, \
                    r.ticket_tier_id, t.name AS tier_name, r.status, k.ticket_code \
             FROM registrations r \
             JOIN events e ON e.id = r.event_id \
             JOIN ticket_tiers t ON t.id = r.ticket_tier_id \
             LEFT JOIN tickets k ON k.registration_id = r.id \
             WHERE r.user_id = $1 \
             ORDER BY e.start_time, r.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_registration(&self, id: Uuid) -> StoreResult<Option<Registration>> {
        let query = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1");
        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(registration)
    }

    async fn find_artifact_by_code(&self, code: &str) -> StoreResult<Option<TicketArtifact>> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_code = $1");
        let artifact = sqlx::query_as::<_, TicketArtifact>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(artifact)
    }

    async fn confirmed_attendees(&self, event_id: Uuid) -> StoreResult<Vec<Attendee>> {
        let attendees = sqlx::query_as::<_, Attendee>(
            "SELECT r.id AS registration_id, u.id AS user_id, u.name, u.email \
             FROM registrations r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 AND r.status = $2 \
             ORDER BY r.created_at",
        )
        .bind(event_id)
        .bind(RegistrationStatus::Confirmed)
        .fetch_all(&self.pool)
        .await?;
        Ok(attendees)
    }

    async fn events_due_for_reminder(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE status = $1 AND start_time > $2 AND start_time <= $3 \
               AND reminder_sent = FALSE \
             ORDER BY start_time"
        );
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(EventStatus::Published)
            .bind(after)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn mark_reminder_sent(&self, event_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE events SET reminder_sent = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(event)
    }

    async fn lock_tier(
        &mut self,
        event_id: Uuid,
        tier_id: Uuid,
    ) -> StoreResult<Option<TicketTier>> {
        let query = format!(
            "SELECT {TIER_COLUMNS} FROM ticket_tiers WHERE id = $1 AND event_id = $2 FOR UPDATE"
        );
        let tier = sqlx::query_as::<_, TicketTier>(&query)
            .bind(tier_id)
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(tier)
    }

    async fn lock_registration(&mut self, id: Uuid) -> StoreResult<Option<Registration>> {
        let query =
            format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE");
        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(registration)
    }

    async fn load_event(&mut self, id: Uuid) -> StoreResult<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(event)
    }

    async fn load_tier(&mut self, id: Uuid) -> StoreResult<Option<TicketTier>> {
        let query = format!("SELECT {TIER_COLUMNS} FROM ticket_tiers WHERE id = $1");
        let tier = sqlx::query_as::<_, TicketTier>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(tier)
    }

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO events (id, title, description, status, start_time, total_capacity, \
                                 remaining_capacity, reminder_sent, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.status)
        .bind(event.start_time)
        .bind(event.total_capacity)
        .bind(event.remaining_capacity)
        .bind(event.reminder_sent)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_tier(&mut self, tier: &TicketTier) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO ticket_tiers (id, event_id, name, price, capacity, remaining_capacity, \
                                       created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(tier.id)
        .bind(tier.event_id)
        .bind(&tier.name)
        .bind(tier.price)
        .bind(tier.capacity)
        .bind(tier.remaining_capacity)
        .bind(tier.created_at)
        .bind(tier.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_event(&mut self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            "UPDATE events SET title = $2, description = $3, status = $4, start_time = $5, \
                    total_capacity = $6, remaining_capacity = $7, reminder_sent = $8, \
                    updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.status)
        .bind(event.start_time)
        .bind(event.total_capacity)
        .bind(event.remaining_capacity)
        .bind(event.reminder_sent)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_tier(&mut self, tier: &TicketTier) -> StoreResult<()> {
        sqlx::query(
            "UPDATE ticket_tiers SET name = $2, price = $3, capacity = $4, \
                    remaining_capacity = $5, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(tier.id)
        .bind(&tier.name)
        .bind(tier.price)
        .bind(tier.capacity)
        .bind(tier.remaining_capacity)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_registration(&mut self, registration: &Registration) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, ticket_tier_id, status, \
                                        created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(registration.id)
        .bind(registration.user_id)
        .bind(registration.event_id)
        .bind(registration.ticket_tier_id)
        .bind(registration.status)
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_registration(&mut self, registration: &Registration) -> StoreResult<()> {
        sqlx::query(
            "UPDATE registrations SET user_id = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(registration.id)
        .bind(registration.user_id)
        .bind(registration.status)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_artifact(&mut self, artifact: &TicketArtifact) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tickets (id, registration_id, ticket_code, qr_payload, document_url, \
                                  created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(artifact.id)
        .bind(artifact.registration_id)
        .bind(&artifact.ticket_code)
        .bind(&artifact.qr_payload)
        .bind(&artifact.document_url)
        .bind(artifact.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_artifact(&mut self, registration_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM tickets WHERE registration_id = $1")
            .bind(registration_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn ticket_code_taken(&mut self, code: &str) -> StoreResult<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tickets WHERE ticket_code = $1)")
                .bind(code)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(taken)
    }

    async fn append_audit(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (id, actor_id, action, entity_type, entity_id, before, \
                                     after, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.before)
        .bind(&entry.after)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
