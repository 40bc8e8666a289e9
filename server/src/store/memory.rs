//! In-process [`CapacityStore`] with the same locking contract as Postgres.
//!
//! Every row has its own async mutex. A [`MemoryTransaction`] keeps the
//! guards it acquired and stages its writes locally; `commit` checks the
//! table constraints and applies the staged writes under the table mutex.
//! Dropping the transaction discards the staged writes and releases the
//! locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::{CapacityStore, StoreError, StoreResult, StoreTransaction};
use crate::models::{
    Attendee, AuditEntry, Event, EventStatus, Registration, RegistrationStatus,
    RegistrationSummary, TicketArtifact, TicketTier, User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Event(Uuid),
    Tier(Uuid),
    Registration(Uuid),
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    tiers: HashMap<Uuid, TicketTier>,
    registrations: HashMap<Uuid, Registration>,
    // keyed by registration id
    tickets: HashMap<Uuid, TicketArtifact>,
    audit: Vec<AuditEntry>,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    locks: Mutex<HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, key: RowKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, name: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.shared.tables().users.insert(user.id, user.clone());
        user
    }

    /// Insert an event and its tiers. The event's capacity is the tier sum.
    pub fn add_event(
        &self,
        title: &str,
        status: EventStatus,
        start_time: DateTime<Utc>,
        tiers: &[(&str, i32)],
    ) -> (Event, Vec<TicketTier>) {
        let now = Utc::now();
        let event_id = Uuid::new_v4();
        let tiers: Vec<TicketTier> = tiers
            .iter()
            .enumerate()
            .map(|(position, (name, capacity))| TicketTier {
                id: Uuid::new_v4(),
                event_id,
                name: name.to_string(),
                price: Decimal::ZERO,
                capacity: *capacity,
                remaining_capacity: *capacity,
                // keeps listing order equal to seeding order
                created_at: now + chrono::Duration::milliseconds(position as i64),
                updated_at: now,
            })
            .collect();
        let total: i32 = tiers.iter().map(|t| t.capacity).sum();
        let event = Event {
            id: event_id,
            title: title.to_string(),
            description: None,
            status,
            start_time,
            total_capacity: total,
            remaining_capacity: total,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.shared.tables();
        tables.events.insert(event.id, event.clone());
        for tier in &tiers {
            tables.tiers.insert(tier.id, tier.clone());
        }
        (event, tiers)
    }

    pub fn remove_tier(&self, tier_id: Uuid) {
        self.shared.tables().tiers.remove(&tier_id);
    }

    pub fn event(&self, id: Uuid) -> Option<Event> {
        self.shared.tables().events.get(&id).cloned()
    }

    pub fn tier(&self, id: Uuid) -> Option<TicketTier> {
        self.shared.tables().tiers.get(&id).cloned()
    }

    pub fn registration(&self, id: Uuid) -> Option<Registration> {
        self.shared.tables().registrations.get(&id).cloned()
    }

    pub fn registrations_for_event(&self, event_id: Uuid) -> Vec<Registration> {
        self.shared
            .tables()
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect()
    }

    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.shared.tables().audit.clone()
    }
}

#[async_trait]
impl CapacityStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            shared: self.shared.clone(),
            held: HashMap::new(),
            staged: Staged::default(),
        })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.shared.tables().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .shared
            .tables()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.event(id))
    }

    async fn list_tiers(&self, event_id: Uuid) -> StoreResult<Vec<TicketTier>> {
        let mut tiers: Vec<TicketTier> = self
            .shared
            .tables()
            .tiers
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        tiers.sort_by_key(|t| (t.created_at, t.id));
        Ok(tiers)
    }

    async fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<RegistrationSummary>> {
        let tables = self.shared.tables();
        let mut rows: Vec<RegistrationSummary> = tables
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                let event = tables.events.get(&r.event_id)?;
                let tier = tables.tiers.get(&r.ticket_tier_id)?;
                Some(RegistrationSummary {
                    id: r.id,
                    event_id: r.event_id,
                    event_title: event.title.clone(),
                    event_start_time: event.start_time,
                    ticket_tier_id: r.ticket_tier_id,
                    tier_name: tier.name.clone(),
                    status: r.status,
                    ticket_code: tables.tickets.get(&r.id).map(|t| t.ticket_code.clone()),
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.event_start_time, r.id));
        Ok(rows)
    }

    async fn find_registration(&self, id: Uuid) -> StoreResult<Option<Registration>> {
        Ok(self.registration(id))
    }

    async fn find_artifact_by_code(&self, code: &str) -> StoreResult<Option<TicketArtifact>> {
        Ok(self
            .shared
            .tables()
            .tickets
            .values()
            .find(|t| t.ticket_code == code)
            .cloned())
    }

    async fn confirmed_attendees(&self, event_id: Uuid) -> StoreResult<Vec<Attendee>> {
        let tables = self.shared.tables();
        let mut confirmed: Vec<&Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Confirmed)
            .collect();
        confirmed.sort_by_key(|r| (r.created_at, r.id));
        Ok(confirmed
            .into_iter()
            .filter_map(|r| {
                let user = tables.users.get(&r.user_id)?;
                Some(Attendee {
                    registration_id: r.id,
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                })
            })
            .collect())
    }

    async fn events_due_for_reminder(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let mut due: Vec<Event> = self
            .shared
            .tables()
            .events
            .values()
            .filter(|e| {
                e.status == EventStatus::Published
                    && e.start_time > after
                    && e.start_time <= until
                    && !e.reminder_sent
            })
            .cloned()
            .collect();
        due.sort_by_key(|e| e.start_time);
        Ok(due)
    }

    async fn mark_reminder_sent(&self, event_id: Uuid) -> StoreResult<()> {
        // Same row lock an UPDATE would wait on.
        let lock = self.shared.row_lock(RowKey::Event(event_id));
        let _guard = lock.lock().await;
        if let Some(event) = self.shared.tables().events.get_mut(&event_id) {
            event.reminder_sent = true;
            event.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
struct Staged {
    inserted_events: HashMap<Uuid, Event>,
    events: HashMap<Uuid, Event>,
    inserted_tiers: HashMap<Uuid, TicketTier>,
    tiers: HashMap<Uuid, TicketTier>,
    inserted_registrations: HashMap<Uuid, Registration>,
    registrations: HashMap<Uuid, Registration>,
    // `None` marks a deletion
    tickets: HashMap<Uuid, Option<TicketArtifact>>,
    audit: Vec<AuditEntry>,
}

pub struct MemoryTransaction {
    shared: Arc<Shared>,
    held: HashMap<RowKey, OwnedMutexGuard<()>>,
    staged: Staged,
}

impl MemoryTransaction {
    async fn acquire(&mut self, key: RowKey) {
        if self.held.contains_key(&key) {
            return;
        }
        let guard = self.shared.row_lock(key).lock_owned().await;
        self.held.insert(key, guard);
    }

    fn current_event(&self, id: Uuid) -> Option<Event> {
        self.staged
            .events
            .get(&id)
            .or_else(|| self.staged.inserted_events.get(&id))
            .cloned()
            .or_else(|| self.shared.tables().events.get(&id).cloned())
    }

    fn current_tier(&self, id: Uuid) -> Option<TicketTier> {
        self.staged
            .tiers
            .get(&id)
            .or_else(|| self.staged.inserted_tiers.get(&id))
            .cloned()
            .or_else(|| self.shared.tables().tiers.get(&id).cloned())
    }

    fn current_registration(&self, id: Uuid) -> Option<Registration> {
        self.staged
            .registrations
            .get(&id)
            .or_else(|| self.staged.inserted_registrations.get(&id))
            .cloned()
            .or_else(|| self.shared.tables().registrations.get(&id).cloned())
    }
}

fn check_constraints(staged: &Staged, tables: &Tables) -> StoreResult<()> {
    for event in staged.events.values().chain(staged.inserted_events.values()) {
        if event.remaining_capacity < 0 || event.remaining_capacity > event.total_capacity {
            return Err(StoreError::Conflict(format!(
                "event {} remaining_capacity {} outside 0..={}",
                event.id, event.remaining_capacity, event.total_capacity
            )));
        }
    }
    for tier in staged.tiers.values().chain(staged.inserted_tiers.values()) {
        if tier.remaining_capacity < 0 || tier.remaining_capacity > tier.capacity {
            return Err(StoreError::Conflict(format!(
                "tier {} remaining_capacity {} outside 0..={}",
                tier.id, tier.remaining_capacity, tier.capacity
            )));
        }
    }
    for ticket in staged.tickets.values().flatten() {
        let taken = tables.tickets.values().any(|existing| {
            existing.ticket_code == ticket.ticket_code
                && !matches!(staged.tickets.get(&existing.registration_id), Some(None))
        });
        if taken {
            return Err(StoreError::Conflict(format!(
                "ticket code {} already issued",
                ticket.ticket_code
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<Event>> {
        if self.current_event(id).is_none() {
            return Ok(None);
        }
        self.acquire(RowKey::Event(id)).await;
        Ok(self.current_event(id))
    }

    async fn lock_tier(
        &mut self,
        event_id: Uuid,
        tier_id: Uuid,
    ) -> StoreResult<Option<TicketTier>> {
        let belongs = self
            .current_tier(tier_id)
            .is_some_and(|t| t.event_id == event_id);
        if !belongs {
            return Ok(None);
        }
        self.acquire(RowKey::Tier(tier_id)).await;
        Ok(self.current_tier(tier_id))
    }

    async fn lock_registration(&mut self, id: Uuid) -> StoreResult<Option<Registration>> {
        if self.current_registration(id).is_none() {
            return Ok(None);
        }
        self.acquire(RowKey::Registration(id)).await;
        Ok(self.current_registration(id))
    }

    async fn load_event(&mut self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.current_event(id))
    }

    async fn load_tier(&mut self, id: Uuid) -> StoreResult<Option<TicketTier>> {
        Ok(self.current_tier(id))
    }

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()> {
        if self.current_event(event.id).is_some() {
            return Err(StoreError::Conflict(format!("event {} already exists", event.id)));
        }
        self.staged.inserted_events.insert(event.id, event.clone());
        Ok(())
    }

    async fn insert_tier(&mut self, tier: &TicketTier) -> StoreResult<()> {
        if self.current_tier(tier.id).is_some() {
            return Err(StoreError::Conflict(format!("tier {} already exists", tier.id)));
        }
        if self.current_event(tier.event_id).is_none() {
            return Err(StoreError::Conflict(format!(
                "tier {} references missing event {}",
                tier.id, tier.event_id
            )));
        }
        self.staged.inserted_tiers.insert(tier.id, tier.clone());
        Ok(())
    }

    async fn save_event(&mut self, event: &Event) -> StoreResult<()> {
        if let Some(inserted) = self.staged.inserted_events.get_mut(&event.id) {
            *inserted = event.clone();
        } else {
            self.staged.events.insert(event.id, event.clone());
        }
        Ok(())
    }

    async fn save_tier(&mut self, tier: &TicketTier) -> StoreResult<()> {
        if let Some(inserted) = self.staged.inserted_tiers.get_mut(&tier.id) {
            *inserted = tier.clone();
        } else {
            self.staged.tiers.insert(tier.id, tier.clone());
        }
        Ok(())
    }

    async fn insert_registration(&mut self, registration: &Registration) -> StoreResult<()> {
        let exists = self.shared.tables().registrations.contains_key(&registration.id)
            || self.staged.inserted_registrations.contains_key(&registration.id);
        if exists {
            return Err(StoreError::Conflict(format!(
                "registration {} already exists",
                registration.id
            )));
        }
        self.staged
            .inserted_registrations
            .insert(registration.id, registration.clone());
        Ok(())
    }

    async fn save_registration(&mut self, registration: &Registration) -> StoreResult<()> {
        if self.staged.inserted_registrations.contains_key(&registration.id) {
            self.staged
                .inserted_registrations
                .insert(registration.id, registration.clone());
        } else {
            self.staged
                .registrations
                .insert(registration.id, registration.clone());
        }
        Ok(())
    }

    async fn insert_artifact(&mut self, artifact: &TicketArtifact) -> StoreResult<()> {
        let occupied = match self.staged.tickets.get(&artifact.registration_id) {
            Some(staged) => staged.is_some(),
            None => self
                .shared
                .tables()
                .tickets
                .contains_key(&artifact.registration_id),
        };
        if occupied {
            return Err(StoreError::Conflict(format!(
                "registration {} already has a ticket",
                artifact.registration_id
            )));
        }
        self.staged
            .tickets
            .insert(artifact.registration_id, Some(artifact.clone()));
        Ok(())
    }

    async fn delete_artifact(&mut self, registration_id: Uuid) -> StoreResult<()> {
        self.staged.tickets.insert(registration_id, None);
        Ok(())
    }

    async fn ticket_code_taken(&mut self, code: &str) -> StoreResult<bool> {
        let staged = self
            .staged
            .tickets
            .values()
            .flatten()
            .any(|t| t.ticket_code == code);
        let committed = self.shared.tables().tickets.values().any(|t| {
            t.ticket_code == code
                && !matches!(self.staged.tickets.get(&t.registration_id), Some(None))
        });
        Ok(staged || committed)
    }

    async fn append_audit(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        self.staged.audit.push(entry.clone());
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        let now = Utc::now();
        {
            let mut tables = self.shared.tables();
            check_constraints(&self.staged, &tables)?;
            let staged = self.staged;

            tables.events.extend(staged.inserted_events);
            for (id, event) in staged.events {
                if let Some(row) = tables.events.get_mut(&id) {
                    *row = Event {
                        created_at: row.created_at,
                        updated_at: now,
                        ..event
                    };
                }
            }
            tables.tiers.extend(staged.inserted_tiers);
            for (id, tier) in staged.tiers {
                if let Some(row) = tables.tiers.get_mut(&id) {
                    *row = TicketTier {
                        created_at: row.created_at,
                        updated_at: now,
                        ..tier
                    };
                }
            }
            tables.registrations.extend(staged.inserted_registrations);
            for (id, registration) in staged.registrations {
                if let Some(row) = tables.registrations.get_mut(&id) {
                    row.user_id = registration.user_id;
                    row.status = registration.status;
                    row.updated_at = now;
                }
            }
            for (registration_id, ticket) in staged.tickets {
                match ticket {
                    Some(ticket) => {
                        tables.tickets.insert(registration_id, ticket);
                    }
                    None => {
                        tables.tickets.remove(&registration_id);
                    }
                }
            }
            tables.audit.extend(staged.audit);
        }
        drop(self.held);
        Ok(())
    }
}
