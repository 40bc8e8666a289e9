use std::sync::Arc;

use tracing::warn;

use crate::worker::{NotificationTask, SubmitError, WorkerPool};

/// Best-effort hand-off used by request paths.
///
/// Never blocks and never fails the caller: if the task cannot be queued it
/// is logged and dropped.
pub trait Notifier: Send + Sync {
    fn notify(&self, task: NotificationTask);
}

pub struct PoolNotifier {
    pool: Arc<WorkerPool>,
}

impl PoolNotifier {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }
}

impl Notifier for PoolNotifier {
    fn notify(&self, task: NotificationTask) {
        match self.pool.try_submit(task) {
            Ok(()) => {}
            Err(SubmitError::Full(task)) => {
                warn!(
                    kind = task.kind().as_str(),
                    recipient = task.recipient(),
                    "Notification queue full, dropping task"
                );
            }
            Err(SubmitError::Closed(task)) => {
                warn!(
                    kind = task.kind().as_str(),
                    recipient = task.recipient(),
                    "Worker pool not running, dropping task"
                );
            }
        }
    }
}

/// Discards every task.
#[derive(Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: NotificationTask) {}
}
