use std::sync::Arc;
use std::time::Duration;

use meteo_core::{Outcome, Reading};
use meteo_feed::{convert, FeedSource};
use meteo_store::{ReadingStore, SnapshotWriter};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::state::SchedulerState;
use crate::types::{CycleReport, Phase, RunSummary, TickReport};

/// Shortest wait between ticks.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// The run loop: one fetch → convert → snapshot → store cycle per tick
/// while running, a paused notice otherwise, then a cancellable wait.
pub struct IngestEngine {
    source: Box<dyn FeedSource>,
    store: ReadingStore,
    snapshot: SnapshotWriter,
    interval: Duration,
    /// If set, every tick is reported here.
    reports_tx: Option<mpsc::Sender<TickReport>>,
}

impl IngestEngine {
    /// Build an engine. `interval` is raised to [`MIN_INTERVAL`] if shorter.
    ///
    /// Reports are sent with `try_send`, so a slow consumer never stalls the
    /// loop.
    pub fn new(
        source: Box<dyn FeedSource>,
        store: ReadingStore,
        snapshot: SnapshotWriter,
        interval: Duration,
        reports_tx: Option<mpsc::Sender<TickReport>>,
    ) -> Self {
        Self {
            source,
            store,
            snapshot,
            interval: interval.max(MIN_INTERVAL),
            reports_tx,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Main loop. Returns once shutdown is requested through `state`.
    ///
    /// Phase changes made while a cycle is in flight apply from the next
    /// tick. Shutdown interrupts the interval wait but not a running cycle.
    pub async fn run(self, state: Arc<SchedulerState>) -> RunSummary {
        info!(
            url = %self.source.source_url(),
            interval_secs = self.interval.as_secs(),
            phase = %state.phase(),
            "ingest loop started"
        );
        let shutdown = state.shutdown_token();
        let mut summary = RunSummary::default();

        while !state.is_shutting_down() {
            match state.phase() {
                Phase::ShuttingDown => break,
                Phase::Running => {
                    let report = self.run_cycle().await;
                    summary.cycles += 1;
                    self.report(TickReport::Cycle(report));
                }
                Phase::Paused => {
                    println!("Paused; type `start` to resume.");
                    info!("tick skipped: paused");
                    summary.skipped += 1;
                    self.report(TickReport::Paused);
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            cycles = summary.cycles,
            skipped = summary.skipped,
            "ingest loop stopped"
        );
        summary
    }

    /// Execute one full cycle. Never fails: every error becomes part of the
    /// returned report, and the snapshot and store steps always run.
    pub async fn run_cycle(&self) -> CycleReport {
        let url = self.source.source_url();

        let reading = match self.source.fetch().await {
            Ok(xml) => match convert(&xml) {
                Ok(json) => Reading::available(url, json),
                Err(e) => Reading::unavailable(url, e.to_string()),
            },
            Err(e) => Reading::unavailable(url, e.to_string()),
        };

        match reading.outcome() {
            Outcome::Available { .. } => {
                println!("Reading available at {}", reading.timestamp_iso())
            }
            Outcome::Unavailable { error: err } => {
                warn!(%url, error = %err, "feed unavailable");
                println!("Feed unavailable at {}: {err}", reading.timestamp_iso());
            }
        }

        let snapshot_written = match self.snapshot.write(&reading.snapshot()) {
            Ok(()) => {
                println!("JSON saved to {}", self.snapshot.path().display());
                true
            }
            Err(e) => {
                error!(path = %self.snapshot.path().display(), "snapshot write failed: {e}");
                println!("Snapshot not written: {e}");
                false
            }
        };

        let row_id = match self.store.append(&reading) {
            Ok(id) => Some(id),
            Err(e) => {
                error!(path = %self.store.path().display(), snapshot_written, "history append failed: {e}");
                println!("Reading not stored: {e}");
                None
            }
        };

        info!(
            available = reading.is_available(),
            snapshot_written,
            row_id = ?row_id,
            "cycle complete"
        );

        CycleReport {
            reading,
            snapshot_written,
            row_id,
        }
    }

    fn report(&self, report: TickReport) {
        if let Some(ref tx) = self.reports_tx {
            if tx.try_send(report).is_err() {
                warn!("tick report channel full or closed; report dropped");
            }
        }
    }
}
