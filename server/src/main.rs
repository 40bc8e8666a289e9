use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticketing_server::artifacts::LinkRenderer;
use ticketing_server::config::Config;
use ticketing_server::notifications::{
    LogMailer, MailNotificationHandler, Mailer, PoolNotifier, SmtpMailer,
};
use ticketing_server::routes::create_routes;
use ticketing_server::services::{ReminderScanner, ReservationEngine};
use ticketing_server::state::AppState;
use ticketing_server::store::PgStore;
use ticketing_server::worker::WorkerPool;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ticketing_server=debug")),
        )
        .init();

    let config = Config::from_env();

    let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
    info!("Successfully connected to database");

    sqlx::migrate!().run(store.pool()).await?;
    info!("Migrations run successfully");

    let mailer: Arc<dyn Mailer> = match config.email.clone() {
        Some(email) => {
            info!(host = %email.smtp_host, port = email.smtp_port, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(email)?)
        }
        None => {
            warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };

    let pool = Arc::new(WorkerPool::new(
        config.pool,
        Arc::new(MailNotificationHandler::new(mailer)),
    ));
    pool.start();

    let engine = Arc::new(ReservationEngine::new(
        store.clone(),
        Arc::new(LinkRenderer::new(config.ticket_verify_base_url.clone())),
        Arc::new(PoolNotifier::new(pool.clone())),
    ));

    let cancel = CancellationToken::new();
    let scanner = ReminderScanner::new(store, pool.clone())
        .with_interval(config.reminder_interval)
        .with_window(config.reminder_window);
    let scanner_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { scanner.run(cancel).await }
    });

    let app = create_routes(AppState::new(engine), &config);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🚀 Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining background work");
    cancel.cancel();
    if let Err(e) = scanner_handle.await {
        warn!(error = %e, "Reminder scanner task failed");
    }
    pool.shutdown().await;

    info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
