mod series;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

pub use series::SatelliteSeries;

/// Aggregates updated alongside every commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StoreCounters {
    pub fetch_time_total: Duration,
    pub process_time_total: Duration,
    /// Upstream API transactions in the last hour, as last reported.
    pub quota_used: Option<u32>,
}

/// What one successful poll contributes to the counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitTimings {
    pub fetch_time: Duration,
    pub process_time: Duration,
    pub quota_used: Option<u32>,
}

#[derive(Debug, Default)]
struct Shared {
    series: BTreeMap<u32, Arc<SatelliteSeries>>,
    counters: StoreCounters,
}

/// Latest metric window per satellite, shared by one writer and any number of
/// readers.
///
/// Commits swap a whole series in under the lock; readers copy the map of
/// `Arc`s out and do everything else unlocked.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    shared: Arc<StdMutex<Shared>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the series for the satellite in full.
    pub fn commit(&self, series: SatelliteSeries, timings: CommitTimings) {
        let catalog_id = series.id().catalog_id;
        let series = Arc::new(series);

        let previous = {
            let mut locked = self.lock();
            locked.counters.fetch_time_total += timings.fetch_time;
            locked.counters.process_time_total += timings.process_time;
            if timings.quota_used.is_some() {
                locked.counters.quota_used = timings.quota_used;
            }
            locked.series.insert(catalog_id, series)
        };

        drop(previous);
    }

    pub fn snapshot(&self) -> Snapshot {
        let locked = self.lock();
        Snapshot {
            series: locked.series.clone(),
            counters: locked.counters,
        }
    }
}

/// Point-in-time view of the store. Later commits never show through.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    series: BTreeMap<u32, Arc<SatelliteSeries>>,
    counters: StoreCounters,
}

impl Snapshot {
    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    /// Series ordered by catalog id.
    pub fn iter(&self) -> impl Iterator<Item = &SatelliteSeries> {
        self.series.values().map(|s| s.as_ref())
    }

    pub fn get(&self, catalog_id: u32) -> Option<&SatelliteSeries> {
        self.series.get(&catalog_id).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::SatelliteId;
    use crate::testing::{metric, series};
    use std::thread;

    fn timings(fetch_ms: u64, process_ms: u64, quota: Option<u32>) -> CommitTimings {
        CommitTimings {
            fetch_time: Duration::from_millis(fetch_ms),
            process_time: Duration::from_millis(process_ms),
            quota_used: quota,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = TelemetryStore::new().snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.counters(), &StoreCounters::default());
    }

    #[test]
    fn test_commit_replaces_whole_series() {
        let store = TelemetryStore::new();
        store.commit(series(25544, "ISS", 0..10), timings(100, 5, Some(3)));
        store.commit(series(25544, "ISS", 500..503), timings(50, 5, Some(4)));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        let stamps: Vec<_> = snapshot.get(25544).unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![500, 501, 502]);
    }

    #[test]
    fn test_counters_accumulate() {
        let store = TelemetryStore::new();
        store.commit(series(25544, "ISS", 0..2), timings(100, 5, Some(3)));
        store.commit(series(20580, "HST", 0..2), timings(250, 7, None));

        let counters = *store.snapshot().counters();
        assert_eq!(counters.fetch_time_total, Duration::from_millis(350));
        assert_eq!(counters.process_time_total, Duration::from_millis(12));
        // a commit without a quota report keeps the last one
        assert_eq!(counters.quota_used, Some(3));
    }

    #[test]
    fn test_snapshot_ordered_by_catalog_id() {
        let store = TelemetryStore::new();
        for id in [43873, 20580, 25544] {
            store.commit(series(id, "SAT", 0..2), CommitTimings::default());
        }
        let ids: Vec<_> = store.snapshot().iter().map(|s| s.id().catalog_id).collect();
        assert_eq!(ids, vec![20580, 25544, 43873]);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_commit() {
        let store = TelemetryStore::new();
        store.commit(series(25544, "ISS", 0..5), CommitTimings::default());
        let before = store.snapshot();

        store.commit(series(25544, "ISS", 100..102), CommitTimings::default());

        assert_eq!(before.get(25544).unwrap().len(), 5);
        assert_eq!(store.snapshot().get(25544).unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_series() {
        let store = TelemetryStore::new();
        let id = SatelliteId::new(25544, "ISS");

        let writer = {
            let store = store.clone();
            let id = id.clone();
            thread::spawn(move || {
                for generation in 1..=500i64 {
                    let len = (generation % 7 + 1) as usize;
                    let window = SatelliteSeries::from_metrics(
                        id.clone(),
                        300,
                        std::iter::repeat(metric(generation)).take(len),
                    );
                    store.commit(window, CommitTimings::default());
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = store.snapshot();
                        let Some(window) = snapshot.get(25544) else {
                            continue;
                        };
                        let generation = window.iter().next().unwrap().timestamp;
                        assert!(window.iter().all(|m| m.timestamp == generation));
                        assert_eq!(window.len(), (generation % 7 + 1) as usize);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.snapshot().get(25544).unwrap().iter().next().unwrap().timestamp, 500);
    }
}
