//! Periodic event-reminder scan.
//!
//! [`ReminderScanner`] runs as a background task next to the HTTP server.
//! Every tick it looks for published events starting within the reminder
//! window and feeds one reminder per confirmed registrant into the worker
//! pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::store::{CapacityStore, StoreResult};
use crate::worker::{NotificationTask, ReminderNotice, WorkerPool};

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30 * 60);

pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_REMINDER_WINDOW_HOURS: i64 = 24;

pub const MAX_REMINDER_WINDOW_HOURS: i64 = 24 * 366;

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderRun {
    pub events: usize,
    pub submitted: usize,
    pub rejected: usize,
    /// Events skipped after a store error; they stay due for the next scan.
    pub failed: usize,
}

pub struct ReminderScanner<S: CapacityStore> {
    store: S,
    pool: Arc<WorkerPool>,
    interval: Duration,
    window: chrono::Duration,
}

impl<S: CapacityStore> ReminderScanner<S> {
    pub fn new(store: S, pool: Arc<WorkerPool>) -> Self {
        Self {
            store,
            pool,
            interval: DEFAULT_SCAN_INTERVAL,
            window: chrono::Duration::hours(DEFAULT_REMINDER_WINDOW_HOURS),
        }
    }

    /// Anything shorter than [`MIN_SCAN_INTERVAL`] is raised to it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_SCAN_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Reminder interval too short, using the minimum"
            );
        }
        self.interval = interval.max(MIN_SCAN_INTERVAL);
        self
    }

    /// Clamped to `0..=MAX_REMINDER_WINDOW_HOURS` hours.
    pub fn with_window(mut self, window: chrono::Duration) -> Self {
        let max = chrono::Duration::hours(MAX_REMINDER_WINDOW_HOURS);
        let clamped = window.clamp(chrono::Duration::zero(), max);
        if clamped != window {
            tracing::warn!(
                requested_hours = window.num_hours(),
                using_hours = clamped.num_hours(),
                "Reminder window out of range"
            );
        }
        self.window = clamped;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn window(&self) -> chrono::Duration {
        self.window
    }

    /// Scan on every tick until `cancel` fires. The first scan runs
    /// immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            window_hours = self.window.num_hours(),
            "Reminder scanner started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scanner cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_reminders().await {
                        tracing::error!(error = %e, "Failed to process reminders");
                    }
                }
            }
        }
    }

    pub async fn process_reminders(&self) -> StoreResult<ReminderRun> {
        self.process_reminders_at(Utc::now()).await
    }

    /// Scan for events starting in `(now, now + window]`.
    ///
    /// `reminder_sent` is set once every reminder for the event has been
    /// offered to the pool, whether or not the pool accepted it. A store
    /// error on one event is logged and the scan moves on to the next.
    pub async fn process_reminders_at(&self, now: DateTime<Utc>) -> StoreResult<ReminderRun> {
        let until = now
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let events = self.store.events_due_for_reminder(now, until).await?;

        let mut run = ReminderRun {
            events: events.len(),
            ..ReminderRun::default()
        };

        for event in events {
            let attendees = match self.store.confirmed_attendees(event.id).await {
                Ok(attendees) => attendees,
                Err(e) => {
                    run.failed += 1;
                    tracing::error!(event_id = %event.id, error = %e, "Failed to load attendees for reminder");
                    continue;
                }
            };
            tracing::debug!(
                event_id = %event.id,
                attendees = attendees.len(),
                "Queueing event reminders"
            );

            for attendee in attendees {
                let task = NotificationTask::EventReminder(ReminderNotice {
                    email: attendee.email,
                    name: attendee.name,
                    registration_id: attendee.registration_id,
                    event_title: event.title.clone(),
                    start_time: event.start_time,
                });
                match self.pool.submit(task).await {
                    Ok(()) => run.submitted += 1,
                    Err(e) => {
                        run.rejected += 1;
                        tracing::warn!(
                            event_id = %event.id,
                            registration_id = %attendee.registration_id,
                            error = %e,
                            "Reminder not queued"
                        );
                    }
                }
            }

            if let Err(e) = self.store.mark_reminder_sent(event.id).await {
                run.failed += 1;
                tracing::error!(event_id = %event.id, error = %e, "Failed to mark reminder as sent");
            }
        }

        if run.events > 0 {
            tracing::info!(
                events = run.events,
                submitted = run.submitted,
                rejected = run.rejected,
                failed = run.failed,
                "Processed event reminders"
            );
        }

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::DeliveryError;
    use crate::store::MemoryStore;
    use crate::worker::{PoolConfig, TaskHandler};
    use async_trait::async_trait;

    struct DiscardHandler;

    #[async_trait]
    impl TaskHandler for DiscardHandler {
        async fn handle(&self, _task: NotificationTask) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn scanner() -> ReminderScanner<MemoryStore> {
        let pool = Arc::new(WorkerPool::new(PoolConfig::default(), Arc::new(DiscardHandler)));
        ReminderScanner::new(MemoryStore::new(), pool)
    }

    #[tokio::test]
    async fn test_zero_interval_is_raised_and_loop_still_runs() {
        let scanner = scanner().with_interval(Duration::ZERO);
        assert_eq!(scanner.interval(), MIN_SCAN_INTERVAL);

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });
        tokio::time::timeout(Duration::from_secs(2), scanner.run(cancel))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_window_is_clamped_and_end_of_time_does_not_overflow() {
        let scanner = scanner().with_window(chrono::Duration::weeks(52 * 1000));
        assert_eq!(
            scanner.window(),
            chrono::Duration::hours(MAX_REMINDER_WINDOW_HOURS)
        );
        assert_eq!(
            self::scanner().with_window(chrono::Duration::hours(-3)).window(),
            chrono::Duration::zero()
        );

        let run = scanner
            .process_reminders_at(DateTime::<Utc>::MAX_UTC - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(run, ReminderRun::default());
    }
}
