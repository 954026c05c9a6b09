use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::{
    models::notification::{MissedDose, NotifyOutcome},
    services::{
        medicines::MedicineStore,
        metrics::{MISSED_DOSES_COUNTER, SWEEP_RUNS_COUNTER},
        notifications::NotificationService,
    },
};

/// Source of "now" for the sweep.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time; medicine times are stored as local times of day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub missed: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("a missed-dose sweep is already running")]
    AlreadyRunning,

    #[error("overdue medicine query failed: {0:#}")]
    Query(#[source] anyhow::Error),

    #[error("overdue medicine query timed out after {0:?}")]
    Timeout(Duration),
}

/// Finds untaken doses whose time has passed `as_of - lookback` and notifies the
/// primary caregiver of each, one at a time, in the order the store returns them.
pub struct MissedDoseSweep {
    medicines: Arc<dyn MedicineStore>,
    notifications: Arc<NotificationService>,
    lookback: chrono::Duration,
    query_timeout: Duration,
    running: AtomicBool,
}

/// Clears the running flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MissedDoseSweep {
    pub fn new(
        medicines: Arc<dyn MedicineStore>,
        notifications: Arc<NotificationService>,
        lookback: chrono::Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            medicines,
            notifications,
            lookback,
            query_timeout,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The overdue query on its own, bounded by the query timeout.
    pub async fn find_missed(&self, as_of: NaiveDateTime) -> Result<Vec<MissedDose>, SweepError> {
        tokio::time::timeout(
            self.query_timeout,
            self.medicines.find_overdue_unacknowledged(as_of, self.lookback),
        )
        .await
        .map_err(|_| SweepError::Timeout(self.query_timeout))?
        .map_err(SweepError::Query)
    }

    /// One evaluation. A trigger that arrives while another run is in flight is
    /// rejected with [`SweepError::AlreadyRunning`] rather than queued.
    pub async fn run(&self, as_of: NaiveDateTime) -> Result<SweepReport, SweepError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            SWEEP_RUNS_COUNTER.with_label_values(&["overlapped"]).inc();
            return Err(SweepError::AlreadyRunning);
        };

        info!("Running scheduled check for missed medicine doses (as of {})", as_of);
        let doses = match self.find_missed(as_of).await {
            Ok(doses) => doses,
            Err(e) => {
                SWEEP_RUNS_COUNTER.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        let mut report = SweepReport {
            missed: doses.len(),
            ..Default::default()
        };
        MISSED_DOSES_COUNTER.inc_by(doses.len() as f64);

        if doses.is_empty() {
            info!("No missed medicine doses found.");
        } else {
            info!("Found {} missed medicine doses.", doses.len());
        }

        for dose in &doses {
            match self.notifications.notify(dose.user_id, &dose.name).await {
                Ok(NotifyOutcome::Sent { .. }) => report.sent += 1,
                Ok(NotifyOutcome::Skipped) => report.skipped += 1,
                Err(_) => report.failed += 1,
            }
        }

        SWEEP_RUNS_COUNTER.with_label_values(&["completed"]).inc();
        info!(
            "Missed-dose sweep complete: {} missed, {} sent, {} skipped, {} failed",
            report.missed, report.sent, report.skipped, report.failed
        );
        Ok(report)
    }
}

/// Spawn the periodic sweep. The first run fires one `period` after start; late ticks
/// are dropped, not queued. Send `true` on `shutdown` to stop the timer; a run already
/// in progress finishes first.
pub fn start(
    sweep: Arc<MissedDoseSweep>,
    clock: Arc<dyn Clock>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Missed-dose sweep timer stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match sweep.run(clock.now()).await {
                        Ok(_) => {}
                        Err(SweepError::AlreadyRunning) => {
                            warn!("Missed-dose sweep skipped: previous run still in progress");
                        }
                        Err(e) => error!("Error in scheduled missed-dose sweep: {}", e),
                    }
                }
            }
        }
    })
}
