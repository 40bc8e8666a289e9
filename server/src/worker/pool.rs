//! Fixed-size pool of notification workers over one bounded queue.
//!
//! Lifecycle is `Stopped -> Running -> Draining -> Stopped`. Shutdown closes
//! the queue to new work and waits until every task already accepted has been
//! executed; nothing queued is discarded.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::task::NotificationTask;
use crate::notifications::DeliveryError;

/// Executes one task. Implementations dispatch on the task variant.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    async fn handle(&self, task: NotificationTask) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Stopped,
    Running,
    Draining,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("worker pool is not accepting tasks")]
    Closed(NotificationTask),

    #[error("task queue is full")]
    Full(NotificationTask),
}

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 100,
        }
    }
}

struct Inner {
    state: PoolState,
    sender: Option<mpsc::Sender<NotificationTask>>,
    workers: Vec<JoinHandle<()>>,
}

pub struct WorkerPool {
    config: PoolConfig,
    handler: Arc<dyn TaskHandler>,
    inner: Mutex<Inner>,
}

impl WorkerPool {
    pub fn new(config: PoolConfig, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            config: PoolConfig {
                workers: config.workers.max(1),
                queue_capacity: config.queue_capacity.max(1),
            },
            handler,
            inner: Mutex::new(Inner {
                state: PoolState::Stopped,
                sender: None,
                workers: Vec::new(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PoolState {
        self.inner().state
    }

    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut inner = self.inner();
        if inner.state != PoolState::Stopped {
            warn!(state = ?inner.state, "Worker pool already started");
            return;
        }

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        inner.workers = (0..self.config.workers)
            .map(|id| {
                let receiver = receiver.clone();
                let handler = self.handler.clone();
                tokio::spawn(run_worker(id, receiver, handler))
            })
            .collect();
        inner.sender = Some(sender);
        inner.state = PoolState::Running;

        info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            "Worker pool started"
        );
    }

    fn sender(&self) -> Option<mpsc::Sender<NotificationTask>> {
        let inner = self.inner();
        match inner.state {
            PoolState::Running => inner.sender.clone(),
            PoolState::Stopped | PoolState::Draining => None,
        }
    }

    /// Enqueue a task, waiting for space while the queue is full.
    pub async fn submit(&self, task: NotificationTask) -> Result<(), SubmitError> {
        let Some(sender) = self.sender() else {
            return Err(SubmitError::Closed(task));
        };
        sender
            .send(task)
            .await
            .map_err(|rejected| SubmitError::Closed(rejected.0))
    }

    /// Enqueue without waiting. Fails with [`SubmitError::Full`] instead of
    /// applying back-pressure.
    pub fn try_submit(&self, task: NotificationTask) -> Result<(), SubmitError> {
        let Some(sender) = self.sender() else {
            return Err(SubmitError::Closed(task));
        };
        sender.try_send(task).map_err(|err| match err {
            TrySendError::Full(task) => SubmitError::Full(task),
            TrySendError::Closed(task) => SubmitError::Closed(task),
        })
    }

    /// Stop accepting tasks and wait for the queue to drain.
    ///
    /// A submission that obtained the queue before shutdown began still lands
    /// and is executed; later submissions get [`SubmitError::Closed`].
    pub async fn shutdown(&self) {
        let workers = {
            let mut inner = self.inner();
            if inner.state != PoolState::Running {
                return;
            }
            inner.state = PoolState::Draining;
            // Workers exit once every sender clone is gone and the queue is empty.
            inner.sender = None;
            mem::take(&mut inner.workers)
        };

        info!(workers = workers.len(), "Worker pool draining");
        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker exited abnormally");
            }
        }

        self.inner().state = PoolState::Stopped;
        info!("Worker pool shut down successfully");
    }
}

async fn run_worker(
    id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<NotificationTask>>>,
    handler: Arc<dyn TaskHandler>,
) {
    debug!(worker_id = id, "Worker started");
    loop {
        let next = {
            let mut receiver = receiver.lock().await;
            receiver.recv().await
        };
        let Some(task) = next else {
            break;
        };
        process(id, task, &handler).await;
    }
    debug!(worker_id = id, "Worker stopping");
}

async fn process(worker_id: usize, task: NotificationTask, handler: &Arc<dyn TaskHandler>) {
    let kind = task.kind();
    debug!(worker_id, kind = kind.as_str(), "Worker processing task");

    // Run on its own task so a panicking handler does not take the worker down.
    let handler = handler.clone();
    match tokio::spawn(async move { handler.handle(task).await }).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(worker_id, kind = kind.as_str(), error = %e, "Task failed");
        }
        Err(e) => {
            error!(worker_id, kind = kind.as_str(), error = %e, "Task panicked");
        }
    }
}
