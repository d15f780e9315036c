//! GymHub Server — gym session reservation backend.
//!
//! Entry point that wires configuration, logging, the database, and the
//! service layer together.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use gymhub_core::config::AppConfig;
use gymhub_core::error::AppError;
use gymhub_database::DatabasePool;
use gymhub_database::repositories::{
    EquipmentRepository, NotificationRepository, ReservationRepository, SessionRepository,
    UserRepository, WaitlistRepository,
};
use gymhub_service::{NotificationService, ReservationService, ScheduleService, WaitlistService};

#[tokio::main]
async fn main() {
    let env = std::env::var("GYMHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GymHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect(&config.database).await?;
    if config.database.migrate_on_startup {
        db_pool.run_migrations().await?;
    } else {
        tracing::info!("Startup migrations disabled; assuming schema is current");
    }

    // ── Step 2: Repositories ─────────────────────────────────────
    let pool = db_pool.pool().clone();
    let session_repo = Arc::new(SessionRepository::new(pool.clone()));
    let reservation_repo = Arc::new(ReservationRepository::new(pool.clone()));
    let waitlist_repo = Arc::new(WaitlistRepository::new(pool.clone()));
    let notification_repo = Arc::new(NotificationRepository::new(pool.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let equipment_repo = Arc::new(EquipmentRepository::new(pool));

    // ── Step 3: Services ─────────────────────────────────────────
    let notifications = Arc::new(NotificationService::new(notification_repo.clone()));
    let waitlist = Arc::new(WaitlistService::new(
        session_repo.clone(),
        waitlist_repo.clone(),
        user_repo.clone(),
        notifications.clone(),
    ));
    let _reservations = Arc::new(ReservationService::new(
        session_repo.clone(),
        reservation_repo.clone(),
        user_repo.clone(),
        equipment_repo.clone(),
        notifications.clone(),
        waitlist.clone(),
        config.reservation.clone(),
    ));
    let _schedule = Arc::new(ScheduleService::new(
        session_repo,
        reservation_repo,
        waitlist_repo,
        notifications,
    ));
    tracing::info!("Services initialized");

    if !db_pool.health_check().await? {
        return Err(AppError::database("Database health check failed"));
    }
    tracing::info!("GymHub server ready");

    // ── Step 4: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, closing database pool...");
    db_pool.close().await;
    tracing::info!("GymHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
