use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saathi_api::{
    config::Config,
    db::{self, PgStore},
    routes,
    services::{
        dose_scheduler::{self, MissedDoseSweep, SystemClock},
        metrics,
        notifications::NotificationService,
        sms,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);
    let io_timeout = Duration::from_secs(config.io_timeout_secs);

    let pool = db::create_pool(&config.database_url, config.db_max_connections, io_timeout).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let sms = sms::from_config(&config)?;
    let notifications = Arc::new(NotificationService::new(store.clone(), sms));

    metrics::start(pool.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_task = if config.sweep_enabled {
        let sweep = Arc::new(MissedDoseSweep::new(
            store.clone(),
            notifications.clone(),
            chrono::Duration::minutes(config.sweep_lookback_minutes),
            io_timeout,
        ));
        info!(
            "Missed-dose sweep every {}s with {} min look-back",
            config.sweep_interval_secs, config.sweep_lookback_minutes
        );
        Some(dose_scheduler::start(
            sweep,
            Arc::new(SystemClock),
            Duration::from_secs(config.sweep_interval_secs),
            shutdown_rx,
        ))
    } else {
        info!("Missed-dose sweep disabled");
        None
    };

    let state = AppState {
        profiles: store.clone(),
        medicines: store.clone(),
        caregivers: store.clone(),
        health: store,
        notifications,
        config: config.clone(),
    };

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Saathi API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = sweep_task {
        task.await?;
    }
    pool.close().await;
    info!("Saathi API stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
