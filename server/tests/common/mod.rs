#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Semaphore;

use ticketing_server::artifacts::{
    ArtifactError, ArtifactRenderer, ArtifactRequest, LinkRenderer,
};
use ticketing_server::models::{Event, EventStatus, TicketArtifact, TicketTier, User};
use ticketing_server::notifications::{DeliveryError, Notifier};
use ticketing_server::services::ReservationEngine;
use ticketing_server::store::MemoryStore;
use ticketing_server::worker::{NotificationTask, TaskHandler};

pub const VERIFY_BASE: &str = "https://tickets.test/verify";

/// Keeps every task the engine hands off.
#[derive(Default)]
pub struct RecordingNotifier {
    tasks: Mutex<Vec<NotificationTask>>,
}

impl RecordingNotifier {
    pub fn tasks(&self) -> Vec<NotificationTask> {
        self.tasks.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, task: NotificationTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Records every task a worker executes.
#[derive(Default)]
pub struct RecordingHandler {
    handled: Mutex<Vec<NotificationTask>>,
}

impl RecordingHandler {
    pub fn handled(&self) -> Vec<NotificationTask> {
        self.handled.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    async fn handle(&self, task: NotificationTask) -> Result<(), DeliveryError> {
        self.handled.lock().unwrap().push(task);
        Ok(())
    }
}

/// Holds every task until [`GatedHandler::open`] is called, so a worker can
/// be kept busy on purpose.
pub struct GatedHandler {
    entered: Semaphore,
    gate: Semaphore,
    handled: Mutex<Vec<NotificationTask>>,
}

impl GatedHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Semaphore::new(0),
            gate: Semaphore::new(0),
            handled: Mutex::new(Vec::new()),
        })
    }

    /// Wait until a worker has picked up a task and is blocked on the gate.
    pub async fn wait_until_busy(&self) {
        self.entered.acquire().await.unwrap().forget();
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn handled(&self) -> Vec<NotificationTask> {
        self.handled.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskHandler for GatedHandler {
    async fn handle(&self, task: NotificationTask) -> Result<(), DeliveryError> {
        self.entered.add_permits(1);
        self.gate.acquire().await.unwrap().forget();
        self.handled.lock().unwrap().push(task);
        Ok(())
    }
}

pub struct FailingRenderer;

impl ArtifactRenderer for FailingRenderer {
    fn render(&self, _request: &ArtifactRequest<'_>) -> Result<TicketArtifact, ArtifactError> {
        Err(ArtifactError::Qr("encoder unavailable".to_string()))
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<ReservationEngine<MemoryStore>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_renderer(Arc::new(LinkRenderer::new(VERIFY_BASE)))
    }

    pub fn with_renderer(renderer: Arc<dyn ArtifactRenderer>) -> Self {
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = Arc::new(ReservationEngine::new(
            store.clone(),
            renderer,
            notifier.clone(),
        ));
        Self {
            store,
            notifier,
            engine,
        }
    }

    pub fn published_event(&self, tiers: &[(&str, i32)]) -> (Event, Vec<TicketTier>) {
        self.store.add_event(
            "RustConf",
            EventStatus::Published,
            Utc::now() + Duration::days(7),
            tiers,
        )
    }

    pub fn users(&self, count: usize) -> Vec<User> {
        (0..count)
            .map(|i| {
                self.store
                    .add_user(&format!("User {i}"), &format!("user{i}@example.com"))
            })
            .collect()
    }
}
