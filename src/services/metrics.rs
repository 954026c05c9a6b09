use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, Counter, CounterVec, GaugeVec,
};
use sqlx::PgPool;
use tracing::{debug, warn};

lazy_static! {
    // ── Event counters ─────────────────────────────────────────────────────
    pub static ref SWEEP_RUNS_COUNTER: CounterVec = register_counter_vec!(
        "saathi_sweep_runs_total",
        "Missed-dose sweep runs by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref MISSED_DOSES_COUNTER: Counter = register_counter!(
        "saathi_missed_doses_total",
        "Overdue unacknowledged doses found by the sweep"
    ).unwrap();

    pub static ref NOTIFICATIONS_COUNTER: CounterVec = register_counter_vec!(
        "saathi_caregiver_notifications_total",
        "Caregiver notifications by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref PHOTO_UPLOADS_COUNTER: Counter = register_counter!(
        "saathi_medicine_photos_uploaded_total",
        "Medicine photos stored"
    ).unwrap();

    // ── Record gauges ──────────────────────────────────────────────────────
    pub static ref RECORDS_GAUGE: GaugeVec = register_gauge_vec!(
        "saathi_records_total",
        "Stored records per table",
        &["table"]
    ).unwrap();
}

/// Spawn the background record counter (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    for table in ["profiles", "medicines", "caregivers"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*)::BIGINT FROM {table}"))
            .fetch_one(pool)
            .await?;
        RECORDS_GAUGE.with_label_values(&[table]).set(count as f64);
    }
    debug!("Metrics: record counts refreshed");
    Ok(())
}
