//! Reminder scan feeding the worker pool.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use common::{Harness, RecordingHandler};
use ticketing_server::models::{
    Attendee, Event, EventStatus, Registration, RegistrationSummary, TicketArtifact, TicketTier,
    User,
};
use ticketing_server::services::{ReminderRun, ReminderScanner};
use ticketing_server::store::{CapacityStore, MemoryStore, StoreError, StoreResult};
use ticketing_server::worker::{NotificationTask, PoolConfig, WorkerPool};

fn pool(handler: Arc<RecordingHandler>) -> Arc<WorkerPool> {
    Arc::new(WorkerPool::new(
        PoolConfig {
            workers: 2,
            queue_capacity: 4,
        },
        handler,
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn due_events_get_one_reminder_per_confirmed_registrant() {
    let harness = Harness::new();
    let now = Utc::now();
    let (soon, soon_tiers) = harness.store.add_event(
        "Tomorrow's Gig",
        EventStatus::Published,
        now + Duration::hours(2),
        &[("General", 10)],
    );
    let (later, later_tiers) = harness.store.add_event(
        "Next Week",
        EventStatus::Published,
        now + Duration::hours(48),
        &[("General", 10)],
    );
    let (draft, _) = harness.store.add_event(
        "Unannounced",
        EventStatus::Draft,
        now + Duration::hours(3),
        &[("General", 10)],
    );

    let users = harness.users(3);
    let mut soon_regs = Vec::new();
    for user in &users {
        let issued = harness
            .engine
            .allocate(user.id, soon.id, soon_tiers[0].id)
            .await
            .unwrap();
        soon_regs.push(issued.registration.id);
        harness
            .engine
            .allocate(user.id, later.id, later_tiers[0].id)
            .await
            .unwrap();
    }
    harness.engine.cancel(users[2].id, soon_regs[2]).await.unwrap();

    let handler = Arc::new(RecordingHandler::default());
    let pool = pool(handler.clone());
    pool.start();

    let scanner = ReminderScanner::new(harness.store.clone(), pool.clone());
    let run = scanner.process_reminders_at(now).await.unwrap();
    assert_eq!(
        run,
        ReminderRun {
            events: 1,
            submitted: 2,
            rejected: 0,
            failed: 0,
        }
    );

    assert!(harness.store.event(soon.id).unwrap().reminder_sent);
    assert!(!harness.store.event(later.id).unwrap().reminder_sent);
    assert!(!harness.store.event(draft.id).unwrap().reminder_sent);

    // Already flagged, so a second pass finds nothing.
    let again = scanner.process_reminders_at(now).await.unwrap();
    assert_eq!(again, ReminderRun::default());

    pool.shutdown().await;

    let mut recipients: Vec<String> = handler
        .handled()
        .into_iter()
        .map(|task| match task {
            NotificationTask::EventReminder(notice) => {
                assert_eq!(notice.event_title, "Tomorrow's Gig");
                notice.email
            }
            other => panic!("unexpected task {other:?}"),
        })
        .collect();
    recipients.sort();
    assert_eq!(recipients, vec!["user0@example.com", "user1@example.com"]);
}

#[tokio::test]
async fn events_in_the_past_or_beyond_the_window_are_skipped() {
    let harness = Harness::new();
    let now = Utc::now();
    harness.store.add_event(
        "Yesterday",
        EventStatus::Published,
        now - Duration::hours(1),
        &[("General", 1)],
    );
    harness.store.add_event(
        "Edge",
        EventStatus::Published,
        now + Duration::hours(25),
        &[("General", 1)],
    );

    let handler = Arc::new(RecordingHandler::default());
    let pool = pool(handler.clone());
    pool.start();

    let run = ReminderScanner::new(harness.store.clone(), pool.clone())
        .process_reminders_at(now)
        .await
        .unwrap();
    assert_eq!(run.events, 0);

    // A wider window picks the second one up.
    let run = ReminderScanner::new(harness.store.clone(), pool.clone())
        .with_window(Duration::hours(26))
        .process_reminders_at(now)
        .await
        .unwrap();
    assert_eq!(run.events, 1);

    pool.shutdown().await;
}

#[tokio::test]
async fn reminder_flag_is_set_even_when_the_pool_refuses() {
    let harness = Harness::new();
    let (event, tiers) = harness.published_event(&[("General", 2)]);
    let user = harness.store.add_user("Ada", "ada@example.com");
    harness
        .engine
        .allocate(user.id, event.id, tiers[0].id)
        .await
        .unwrap();

    let handler = Arc::new(RecordingHandler::default());
    let pool = pool(handler.clone());
    pool.start();
    pool.shutdown().await;

    // Event starts in 7 days; scan from 6 days out so it is due.
    let run = ReminderScanner::new(harness.store.clone(), pool)
        .process_reminders_at(Utc::now() + Duration::days(6))
        .await
        .unwrap();

    assert_eq!(run.events, 1);
    assert_eq!(run.submitted, 0);
    assert_eq!(run.rejected, 1);
    assert!(harness.store.event(event.id).unwrap().reminder_sent);
    assert!(handler.handled().is_empty());
}

#[tokio::test]
async fn scanner_loop_stops_on_cancel() {
    let harness = Harness::new();
    let handler = Arc::new(RecordingHandler::default());
    let pool = pool(handler);
    pool.start();

    let scanner = ReminderScanner::new(harness.store.clone(), pool.clone())
        .with_interval(std::time::Duration::from_millis(10));
    let cancel = tokio_util::sync::CancellationToken::new();
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { scanner.run(cancel).await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(1), task)
        .await
        .expect("scanner did not stop")
        .unwrap();

    pool.shutdown().await;
}

/// Memory store whose attendee lookup fails for one event.
#[derive(Clone)]
struct BrokenAttendeeStore {
    inner: MemoryStore,
    broken_event: Uuid,
}

#[async_trait]
impl CapacityStore for BrokenAttendeeStore {
    type Tx = <MemoryStore as CapacityStore>::Tx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        self.inner.begin().await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        self.inner.find_event(id).await
    }

    async fn list_tiers(&self, event_id: Uuid) -> StoreResult<Vec<TicketTier>> {
        self.inner.list_tiers(event_id).await
    }

    async fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<RegistrationSummary>> {
        self.inner.registrations_for_user(user_id).await
    }

    async fn find_registration(&self, id: Uuid) -> StoreResult<Option<Registration>> {
        self.inner.find_registration(id).await
    }

    async fn find_artifact_by_code(&self, code: &str) -> StoreResult<Option<TicketArtifact>> {
        self.inner.find_artifact_by_code(code).await
    }

    async fn confirmed_attendees(&self, event_id: Uuid) -> StoreResult<Vec<Attendee>> {
        if event_id == self.broken_event {
            return Err(StoreError::Conflict("attendee index unavailable".to_string()));
        }
        self.inner.confirmed_attendees(event_id).await
    }

    async fn events_due_for_reminder(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        self.inner.events_due_for_reminder(after, until).await
    }

    async fn mark_reminder_sent(&self, event_id: Uuid) -> StoreResult<()> {
        self.inner.mark_reminder_sent(event_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_failing_event_does_not_stop_the_scan() {
    let harness = Harness::new();
    let now = Utc::now();
    // The broken event starts first, so it is processed before the healthy one.
    let (broken, broken_tiers) = harness.store.add_event(
        "Broken",
        EventStatus::Published,
        now + Duration::hours(1),
        &[("General", 5)],
    );
    let (healthy, healthy_tiers) = harness.store.add_event(
        "Healthy",
        EventStatus::Published,
        now + Duration::hours(2),
        &[("General", 5)],
    );
    let user = harness.store.add_user("Ada", "ada@example.com");
    for (event, tiers) in [(&broken, &broken_tiers), (&healthy, &healthy_tiers)] {
        harness
            .engine
            .allocate(user.id, event.id, tiers[0].id)
            .await
            .unwrap();
    }

    let handler = Arc::new(RecordingHandler::default());
    let pool = pool(handler.clone());
    pool.start();

    let store = BrokenAttendeeStore {
        inner: harness.store.clone(),
        broken_event: broken.id,
    };
    let run = ReminderScanner::new(store, pool.clone())
        .process_reminders_at(now)
        .await
        .unwrap();
    pool.shutdown().await;

    assert_eq!(
        run,
        ReminderRun {
            events: 2,
            submitted: 1,
            rejected: 0,
            failed: 1,
        }
    );
    // The failed event stays due for the next scan.
    assert!(!harness.store.event(broken.id).unwrap().reminder_sent);
    assert!(harness.store.event(healthy.id).unwrap().reminder_sent);
    match handler.handled().as_slice() {
        [NotificationTask::EventReminder(notice)] => assert_eq!(notice.event_title, "Healthy"),
        other => panic!("expected one reminder, got {other:?}"),
    }
}
