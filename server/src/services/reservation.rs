//! Seat reservation: allocation, cancellation, transfer and the registration
//! lifecycle around them.
//!
//! Every mutating operation runs in one store transaction and takes row locks
//! in the order Registration, Event, Tier. Notifications are handed to the
//! [`Notifier`] only after commit.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactRenderer, ArtifactRequest};
use crate::models::audit::{
    ACTION_CANCEL_EVENT, ACTION_CANCEL_REGISTRATION, ACTION_CREATE_EVENT,
    ACTION_CREATE_REGISTRATION, ACTION_CREATE_TIER, ACTION_TRANSFER_TICKET, ACTION_UPDATE_EVENT,
    ACTION_UPDATE_RSVP, ACTION_UPDATE_TIER,
};
use crate::models::{
    Attendee, AuditEntry, Availability, Event, EventDetails, EventStatus, EventUpdate, NewEvent,
    NewTier, Registration, RegistrationStatus, RegistrationSummary, TicketArtifact, TicketTier,
    TicketVerification, TierAvailability, TierUpdate,
};
use crate::notifications::Notifier;
use crate::store::{CapacityStore, StoreError, StoreTransaction};
use crate::utils::AppError;
use crate::worker::{CancellationNotice, NotificationTask, TicketNotice, UpdateNotice};

/// Renders per ticket before giving up on finding an unused code.
const MAX_RENDER_ATTEMPTS: usize = 3;

/// A registration together with the ticket its current holder carries.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTicket {
    pub registration: Registration,
    pub ticket: TicketArtifact,
}

pub struct ReservationEngine<S: CapacityStore> {
    store: S,
    renderer: Arc<dyn ArtifactRenderer>,
    notifier: Arc<dyn Notifier>,
}

impl<S: CapacityStore> ReservationEngine<S> {
    pub fn new(store: S, renderer: Arc<dyn ArtifactRenderer>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            renderer,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserve one seat of `tier_id` for `user_id`.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        tier_id: Uuid,
    ) -> Result<IssuedTicket, AppError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;
        if !event.is_published() {
            return Err(AppError::InvalidState(format!(
                "Event is {} and not open for registration",
                event.status.as_str()
            )));
        }

        let mut tier = tx.lock_tier(event_id, tier_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Ticket tier {tier_id} not found for this event"))
        })?;
        if tier.remaining_capacity <= 0 || event.remaining_capacity <= 0 {
            return Err(AppError::Exhausted(format!(
                "No tickets left in tier '{}'",
                tier.name
            )));
        }

        tier.remaining_capacity -= 1;
        event.remaining_capacity -= 1;
        tx.save_tier(&tier).await?;
        tx.save_event(&event).await?;

        let registration = Registration::confirmed(user.id, event.id, tier.id);
        tx.insert_registration(&registration).await?;

        let ticket = self
            .issue_ticket(
                &mut tx,
                &ArtifactRequest {
                    registration_id: registration.id,
                    event: &event,
                    tier: &tier,
                    holder: &user,
                },
            )
            .await?;

        let audit = AuditEntry::new(
            user.id,
            ACTION_CREATE_REGISTRATION,
            "registration",
            registration.id,
        )
        .with_after(json!({
            "event_id": event.id,
            "ticket_tier_id": tier.id,
            "status": registration.status,
            "ticket_code": ticket.ticket_code,
        }));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(
            registration_id = %registration.id,
            tier_remaining = tier.remaining_capacity,
            event_remaining = event.remaining_capacity,
            "Seat allocated"
        );

        self.notifier
            .notify(NotificationTask::TicketIssued(TicketNotice {
                email: user.email,
                registration_id: registration.id,
                event_title: event.title,
                ticket_code: ticket.ticket_code.clone(),
            }));

        Ok(IssuedTicket {
            registration,
            ticket,
        })
    }

    /// Cancel the caller's registration and return its seat.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        user_id: Uuid,
        registration_id: Uuid,
    ) -> Result<Registration, AppError> {
        let mut tx = self.store.begin().await?;

        let mut registration = tx
            .lock_registration(registration_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Registration {registration_id} not found"))
            })?;
        if registration.status.is_cancelled() {
            return Err(AppError::InvalidState(
                "Registration is already cancelled".to_string(),
            ));
        }
        let previous = registration.status;

        let mut event = tx
            .lock_event(registration.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", registration.event_id)))?;

        registration.status = RegistrationStatus::Cancelled;
        tx.save_registration(&registration).await?;

        event.remaining_capacity += 1;
        tx.save_event(&event).await?;

        match tx
            .lock_tier(registration.event_id, registration.ticket_tier_id)
            .await?
        {
            Some(mut tier) => {
                tier.remaining_capacity += 1;
                tx.save_tier(&tier).await?;
            }
            None => {
                warn!(
                    tier_id = %registration.ticket_tier_id,
                    "Ticket tier missing, only the event counter was restored"
                );
            }
        }

        let audit = AuditEntry::new(
            user_id,
            ACTION_CANCEL_REGISTRATION,
            "registration",
            registration.id,
        )
        .with_before(json!({ "status": previous }))
        .with_after(json!({ "status": registration.status }));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(event_remaining = event.remaining_capacity, "Registration cancelled");
        Ok(registration)
    }

    /// Hand the sender's ticket to the user registered under `recipient_email`.
    ///
    /// Capacity does not move. The old ticket code stops resolving and the
    /// recipient gets a freshly rendered one.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        sender_id: Uuid,
        registration_id: Uuid,
        recipient_email: &str,
    ) -> Result<IssuedTicket, AppError> {
        let recipient = self
            .store
            .find_user_by_email(recipient_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient user not found".to_string()))?;
        if recipient.id == sender_id {
            return Err(AppError::ValidationError(
                "Cannot transfer a ticket to yourself".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let mut registration = tx.lock_registration(registration_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Registration {registration_id} not found"))
        })?;
        if registration.user_id != sender_id {
            return Err(AppError::Forbidden(
                "You are not the owner of this registration".to_string(),
            ));
        }

        let event = tx
            .load_event(registration.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", registration.event_id)))?;
        if registration.status != RegistrationStatus::Confirmed {
            return Err(AppError::InvalidState(
                "Only confirmed registrations can be transferred".to_string(),
            ));
        }
        if !event.is_published() {
            return Err(AppError::InvalidState(format!(
                "Cannot transfer a ticket for an event that is {}",
                event.status.as_str()
            )));
        }

        let tier = tx
            .load_tier(registration.ticket_tier_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Ticket tier {} not found",
                    registration.ticket_tier_id
                ))
            })?;

        let previous_holder = registration.user_id;
        registration.user_id = recipient.id;
        tx.save_registration(&registration).await?;

        tx.delete_artifact(registration.id).await?;
        let ticket = self
            .issue_ticket(
                &mut tx,
                &ArtifactRequest {
                    registration_id: registration.id,
                    event: &event,
                    tier: &tier,
                    holder: &recipient,
                },
            )
            .await?;

        let audit = AuditEntry::new(
            sender_id,
            ACTION_TRANSFER_TICKET,
            "registration",
            registration.id,
        )
        .with_before(json!({ "user_id": previous_holder }))
        .with_after(json!({
            "user_id": recipient.id,
            "recipient_email": recipient.email,
        }));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(recipient_id = %recipient.id, "Ticket transferred");

        self.notifier
            .notify(NotificationTask::TicketTransferred(TicketNotice {
                email: recipient.email,
                registration_id: registration.id,
                event_title: event.title,
                ticket_code: ticket.ticket_code.clone(),
            }));

        Ok(IssuedTicket {
            registration,
            ticket,
        })
    }

    /// Move a live registration along the attendance-intent axis.
    #[instrument(skip(self))]
    pub async fn update_rsvp(
        &self,
        user_id: Uuid,
        registration_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<Registration, AppError> {
        if !status.is_attendance_intent() {
            return Err(AppError::ValidationError(format!(
                "'{}' is not an RSVP status",
                status.as_str()
            )));
        }

        let mut tx = self.store.begin().await?;

        let mut registration = tx
            .lock_registration(registration_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Registration {registration_id} not found"))
            })?;
        if registration.status.is_cancelled() {
            return Err(AppError::InvalidState(
                "Cannot RSVP on a cancelled registration".to_string(),
            ));
        }

        let previous = registration.status;
        registration.status = status;
        tx.save_registration(&registration).await?;

        let audit = AuditEntry::new(user_id, ACTION_UPDATE_RSVP, "registration", registration.id)
            .with_before(json!({ "status": previous }))
            .with_after(json!({ "status": status }));
        tx.append_audit(&audit).await?;

        tx.commit().await?;
        Ok(registration)
    }

    /// Cancel an event and tell every confirmed holder.
    ///
    /// Seats are not released; registrations keep their status.
    #[instrument(skip(self))]
    pub async fn cancel_event(&self, actor_id: Uuid, event_id: Uuid) -> Result<Event, AppError> {
        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;
        if event.status == EventStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Event is already cancelled".to_string(),
            ));
        }

        let previous = event.status;
        event.status = EventStatus::Cancelled;
        tx.save_event(&event).await?;

        let audit = AuditEntry::new(actor_id, ACTION_CANCEL_EVENT, "event", event.id)
            .with_before(json!({ "status": previous }))
            .with_after(json!({ "status": event.status }));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!("Event cancelled");
        self.notify_cancelled(&event).await;
        Ok(event)
    }

    /// Create an event together with its tiers.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_event(
        &self,
        actor_id: Uuid,
        input: NewEvent,
    ) -> Result<EventDetails, AppError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError(
                "title must not be empty".to_string(),
            ));
        }
        let status = input.status.unwrap_or(EventStatus::Draft);
        if status == EventStatus::Cancelled {
            return Err(AppError::ValidationError(
                "An event cannot be created as cancelled".to_string(),
            ));
        }
        for tier in &input.tiers {
            validate_new_tier(tier)?;
        }

        let now = Utc::now();
        let event_id = Uuid::new_v4();
        let tiers: Vec<TicketTier> = input
            .tiers
            .iter()
            .enumerate()
            // offsets keep listing order equal to input order
            .map(|(position, tier)| {
                TicketTier::open(
                    event_id,
                    tier,
                    now + chrono::Duration::milliseconds(position as i64),
                )
            })
            .collect();
        let total = tiers
            .iter()
            .try_fold(0i32, |sum, tier| sum.checked_add(tier.capacity))
            .ok_or_else(|| AppError::ValidationError("Total capacity is too large".to_string()))?;

        let event = Event {
            id: event_id,
            title: title.to_string(),
            description: input.description,
            status,
            start_time: input.start_time,
            total_capacity: total,
            remaining_capacity: total,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_event(&event).await?;
        for tier in &tiers {
            tx.insert_tier(tier).await?;
        }
        let audit = AuditEntry::new(actor_id, ACTION_CREATE_EVENT, "event", event.id)
            .with_after(json!({
                "event": event_snapshot(&event),
                "tiers": tiers.iter().map(tier_snapshot).collect::<Vec<_>>(),
            }));
        tx.append_audit(&audit).await?;
        tx.commit().await?;

        info!(event_id = %event.id, tiers = tiers.len(), "Event created");
        Ok(EventDetails { event, tiers })
    }

    /// Apply an admin edit to an event.
    ///
    /// A cancelled event cannot be changed. Moving the start time re-arms the
    /// reminder. Confirmed holders hear about a new title or start time, or
    /// get a cancellation notice when the edit cancels the event.
    #[instrument(skip(self, changes))]
    pub async fn update_event(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        changes: EventUpdate,
    ) -> Result<Event, AppError> {
        if changes.is_empty() {
            return Err(AppError::ValidationError("No changes supplied".to_string()));
        }
        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "title must not be empty".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;
        if event.status == EventStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Cannot change a cancelled event".to_string(),
            ));
        }
        let before = event_snapshot(&event);

        let mut details_changed = false;
        if let Some(title) = changes.title {
            let title = title.trim();
            if title != event.title {
                event.title = title.to_string();
                details_changed = true;
            }
        }
        if let Some(description) = changes.description {
            event.description = Some(description);
        }
        if let Some(start_time) = changes.start_time {
            if start_time != event.start_time {
                event.start_time = start_time;
                event.reminder_sent = false;
                details_changed = true;
            }
        }
        if let Some(status) = changes.status {
            event.status = status;
        }
        tx.save_event(&event).await?;

        let audit = AuditEntry::new(actor_id, ACTION_UPDATE_EVENT, "event", event.id)
            .with_before(before)
            .with_after(event_snapshot(&event));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(status = event.status.as_str(), details_changed, "Event updated");
        if event.status == EventStatus::Cancelled {
            self.notify_cancelled(&event).await;
        } else if details_changed {
            self.notify_updated(&event).await;
        }
        Ok(event)
    }

    /// Add a tier to an event; its seats join the event totals.
    #[instrument(skip(self, input))]
    pub async fn add_tier(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        input: NewTier,
    ) -> Result<TicketTier, AppError> {
        validate_new_tier(&input)?;

        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;
        if event.status == EventStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Cannot add tiers to a cancelled event".to_string(),
            ));
        }

        let tier = TicketTier::open(event.id, &input, Utc::now());
        shift_event_capacity(&mut event, tier.capacity)?;
        tx.save_event(&event).await?;
        tx.insert_tier(&tier).await?;

        let audit = AuditEntry::new(actor_id, ACTION_CREATE_TIER, "ticket_tier", tier.id)
            .with_after(tier_snapshot(&tier));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(tier_id = %tier.id, event_total = event.total_capacity, "Ticket tier added");
        Ok(tier)
    }

    /// Rename, reprice or resize a tier.
    ///
    /// Locks the event before the tier. A capacity change moves the tier's
    /// remaining seats and both event counters by the same delta and may not
    /// go below the seats already held.
    #[instrument(skip(self, changes))]
    pub async fn update_tier(
        &self,
        actor_id: Uuid,
        event_id: Uuid,
        tier_id: Uuid,
        changes: TierUpdate,
    ) -> Result<TicketTier, AppError> {
        if changes.name.is_none() && changes.price.is_none() && changes.capacity.is_none() {
            return Err(AppError::ValidationError("No changes supplied".to_string()));
        }
        if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }
        if changes.price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(AppError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        if changes.capacity.is_some_and(|c| c < 0) {
            return Err(AppError::ValidationError(
                "capacity must not be negative".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;
        if event.status == EventStatus::Cancelled {
            return Err(AppError::InvalidState(
                "Cannot change tiers of a cancelled event".to_string(),
            ));
        }
        let mut tier = tx.lock_tier(event_id, tier_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Ticket tier {tier_id} not found for this event"))
        })?;
        let before = tier_snapshot(&tier);

        if let Some(name) = changes.name {
            tier.name = name.trim().to_string();
        }
        if let Some(price) = changes.price {
            tier.price = price;
        }
        if let Some(capacity) = changes.capacity {
            let held = tier.held();
            if capacity < held {
                return Err(AppError::InvalidState(format!(
                    "Tier '{}' has {held} seats held; capacity cannot drop below that",
                    tier.name
                )));
            }
            let delta = capacity - tier.capacity;
            tier.capacity = capacity;
            tier.remaining_capacity += delta;
            shift_event_capacity(&mut event, delta)?;
            tx.save_event(&event).await?;
        }
        tx.save_tier(&tier).await?;

        let audit = AuditEntry::new(actor_id, ACTION_UPDATE_TIER, "ticket_tier", tier.id)
            .with_before(before)
            .with_after(tier_snapshot(&tier));
        tx.append_audit(&audit).await?;

        tx.commit().await?;

        info!(
            tier_remaining = tier.remaining_capacity,
            event_remaining = event.remaining_capacity,
            "Ticket tier updated"
        );
        Ok(tier)
    }

    pub async fn my_registrations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RegistrationSummary>, AppError> {
        Ok(self.store.registrations_for_user(user_id).await?)
    }

    pub async fn attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        self.require_event(event_id).await?;
        Ok(self.store.confirmed_attendees(event_id).await?)
    }

    pub async fn availability(&self, event_id: Uuid) -> Result<Availability, AppError> {
        let event = self.require_event(event_id).await?;
        let tiers = self.store.list_tiers(event_id).await?;

        Ok(Availability {
            event_id: event.id,
            status: event.status,
            total_capacity: event.total_capacity,
            remaining_capacity: event.remaining_capacity,
            tiers: tiers
                .into_iter()
                .map(|tier| TierAvailability {
                    tier_id: tier.id,
                    name: tier.name,
                    capacity: tier.capacity,
                    remaining_capacity: tier.remaining_capacity,
                })
                .collect(),
        })
    }

    /// Resolve a ticket code presented at the door.
    pub async fn verify_ticket(&self, code: &str) -> Result<TicketVerification, AppError> {
        let not_found = || AppError::NotFound(format!("Ticket {code} is not valid"));

        let ticket = self
            .store
            .find_artifact_by_code(code)
            .await?
            .ok_or_else(not_found)?;
        let registration = self
            .store
            .find_registration(ticket.registration_id)
            .await?
            .ok_or_else(not_found)?;

        Ok(TicketVerification {
            ticket_code: ticket.ticket_code,
            registration_id: registration.id,
            event_id: registration.event_id,
            holder_id: registration.user_id,
            status: registration.status,
        })
    }

    /// Render a ticket whose code no live ticket uses yet and stage it.
    async fn issue_ticket(
        &self,
        tx: &mut S::Tx,
        request: &ArtifactRequest<'_>,
    ) -> Result<TicketArtifact, AppError> {
        for attempt in 1..=MAX_RENDER_ATTEMPTS {
            let ticket = self.renderer.render(request)?;
            if !tx.ticket_code_taken(&ticket.ticket_code).await? {
                tx.insert_artifact(&ticket).await?;
                return Ok(ticket);
            }
            warn!(attempt, code = %ticket.ticket_code, "Ticket code already issued, rendering again");
        }
        Err(StoreError::Conflict(format!(
            "no unused ticket code after {MAX_RENDER_ATTEMPTS} attempts"
        ))
        .into())
    }

    async fn notify_cancelled(&self, event: &Event) {
        self.notify_attendees(event, |attendee| {
            NotificationTask::EventCancelled(CancellationNotice {
                email: attendee.email,
                registration_id: attendee.registration_id,
                event_title: event.title.clone(),
            })
        })
        .await;
    }

    async fn notify_updated(&self, event: &Event) {
        self.notify_attendees(event, |attendee| {
            NotificationTask::EventUpdated(UpdateNotice {
                email: attendee.email,
                registration_id: attendee.registration_id,
                event_title: event.title.clone(),
                start_time: event.start_time,
            })
        })
        .await;
    }

    /// Best effort: the change is already committed, so a failed lookup is
    /// only logged.
    async fn notify_attendees(&self, event: &Event, task: impl Fn(Attendee) -> NotificationTask) {
        let attendees = match self.store.confirmed_attendees(event.id).await {
            Ok(attendees) => attendees,
            Err(e) => {
                error!(event_id = %event.id, error = %e, "Failed to load attendees to notify");
                return;
            }
        };
        info!(event_id = %event.id, attendees = attendees.len(), "Notifying attendees");
        for attendee in attendees {
            self.notifier.notify(task(attendee));
        }
    }

    async fn require_event(&self, event_id: Uuid) -> Result<Event, AppError> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))
    }
}

fn validate_new_tier(tier: &NewTier) -> Result<(), AppError> {
    if tier.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "tier name must not be empty".to_string(),
        ));
    }
    if tier.capacity < 0 {
        return Err(AppError::ValidationError(
            "tier capacity must not be negative".to_string(),
        ));
    }
    if tier.price < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "tier price must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Move both event counters by `delta`, keeping `0 <= remaining <= total`.
fn shift_event_capacity(event: &mut Event, delta: i32) -> Result<(), AppError> {
    let total = event.total_capacity.checked_add(delta);
    let remaining = event.remaining_capacity.checked_add(delta);
    match (total, remaining) {
        (Some(total), Some(remaining)) if 0 <= remaining && remaining <= total => {
            event.total_capacity = total;
            event.remaining_capacity = remaining;
            Ok(())
        }
        _ => Err(AppError::InvalidState(format!(
            "Event capacity cannot move by {delta} from {}/{}",
            event.remaining_capacity, event.total_capacity
        ))),
    }
}

fn event_snapshot(event: &Event) -> Value {
    json!({
        "title": event.title,
        "description": event.description,
        "status": event.status,
        "start_time": event.start_time,
        "total_capacity": event.total_capacity,
        "remaining_capacity": event.remaining_capacity,
    })
}

fn tier_snapshot(tier: &TicketTier) -> Value {
    json!({
        "event_id": tier.event_id,
        "name": tier.name,
        "price": tier.price,
        "capacity": tier.capacity,
        "remaining_capacity": tier.remaining_capacity,
    })
}
