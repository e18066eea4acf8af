use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, io};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::{Snapshot, TelemetryStore};
use crate::telemetry::DerivedMetric;

#[derive(Debug, Serialize)]
pub struct ArchiveRecord<'a> {
    pub written_at: DateTime<Utc>,
    pub requests_last_hour: Option<u32>,
    pub fetch_time_total_s: f64,
    pub process_time_total_s: f64,
    pub satellites: BTreeMap<String, Vec<&'a DerivedMetric>>,
}

impl<'a> ArchiveRecord<'a> {
    pub fn from_snapshot(snapshot: &'a Snapshot, written_at: DateTime<Utc>) -> Self {
        let counters = snapshot.counters();
        Self {
            written_at,
            requests_last_hour: counters.quota_used,
            fetch_time_total_s: counters.fetch_time_total.as_secs_f64(),
            process_time_total_s: counters.process_time_total.as_secs_f64(),
            satellites: snapshot
                .iter()
                .map(|series| (series.id().to_string(), series.iter().collect()))
                .collect(),
        }
    }
}

/// Writes store snapshots as timestamped JSON files.
pub struct ArchiveWriter {
    folder: PathBuf,
}

impl ArchiveWriter {
    pub fn new(folder: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&folder)?;
        Ok(Self { folder })
    }

    pub fn write(&self, snapshot: &Snapshot, at: DateTime<Utc>) -> io::Result<PathBuf> {
        let path = self
            .folder
            .join(format!("sat_data_{}.json", at.format("%Y-%m-%d_%H-%M-%S")));
        let record = ArchiveRecord::from_snapshot(snapshot, at);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| io::Error::other(format!("Failed to serialize snapshot: {}", e)))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Writes one file every `period`, first one after a full period.
    pub async fn run(
        self,
        store: TelemetryStore,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        log::info!(
            "Archiving snapshots to {} every {:?}",
            self.folder.display(),
            period
        );
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            let should_stop = tokio::select! {
                _ = ticker.tick() => false,
                _ = shutdown.changed() => true,
            };
            if should_stop {
                break;
            }

            let snapshot = store.snapshot();
            match self.write(&snapshot, Utc::now()) {
                Ok(path) => log::info!("Archived {} satellites to {}", snapshot.len(), path.display()),
                Err(e) => log::error!("Failed to archive snapshot: {}", e),
            }
        }
    }
}
