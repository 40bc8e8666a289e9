pub mod pool;
pub mod task;

pub use pool::{PoolConfig, PoolState, SubmitError, TaskHandler, WorkerPool};
pub use task::{
    CancellationNotice, NotificationTask, ReminderNotice, TaskKind, TicketNotice, UpdateNotice,
};
