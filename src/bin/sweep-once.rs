/// Run a single missed-dose sweep against the configured database and exit.
/// Intended for cron-driven deployments that set SWEEP_ENABLED=false on the API.
///
/// Usage: sweep-once [--as-of 2024-06-01T08:45:00] [--lookback-minutes 30] [--dry-run]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use clap::Parser;

use saathi_api::{
    config::Config,
    db::{self, PgStore},
    services::{
        dose_scheduler::{Clock, FixedClock, MissedDoseSweep, SystemClock},
        notifications::NotificationService,
        sms,
    },
};

#[derive(Parser)]
#[command(name = "sweep-once", about = "Run one missed-dose sweep and exit")]
struct Args {
    /// Evaluate as of this local time instead of now
    #[arg(long)]
    as_of: Option<NaiveDateTime>,

    /// Override SWEEP_LOOKBACK_MINUTES
    #[arg(long)]
    lookback_minutes: Option<i64>,

    /// List overdue doses without notifying anyone
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let io_timeout = Duration::from_secs(config.io_timeout_secs);

    let pool = db::create_pool(&config.database_url, 2, io_timeout).await?;
    let store = Arc::new(PgStore::new(pool.clone()));
    let notifications = Arc::new(NotificationService::new(store.clone(), sms::from_config(&config)?));

    let lookback = args.lookback_minutes.unwrap_or(config.sweep_lookback_minutes);
    let sweep = MissedDoseSweep::new(
        store,
        notifications,
        chrono::Duration::minutes(lookback),
        io_timeout,
    );

    let clock: Box<dyn Clock> = match args.as_of {
        Some(at) => Box::new(FixedClock(at)),
        None => Box::new(SystemClock),
    };
    let as_of = clock.now();

    if args.dry_run {
        let doses = sweep.find_missed(as_of).await?;
        tracing::info!("{} overdue dose(s) as of {}", doses.len(), as_of);
        for dose in doses {
            println!("{}\t{}", dose.user_id, dose.name);
        }
    } else {
        let report = sweep.run(as_of).await?;
        println!(
            "missed={} sent={} skipped={} failed={}",
            report.missed, report.sent, report.skipped, report.failed
        );
    }

    pool.close().await;
    Ok(())
}
