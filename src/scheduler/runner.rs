use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use crate::fetch::{FetchError, PositionSource};
use crate::scheduler::PacingPolicy;
use crate::store::{CommitTimings, SatelliteSeries, TelemetryStore};
use crate::telemetry::MetricEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching(u32),
    Deriving(u32),
    Committing(u32),
    Sleeping(Duration),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("no usable sample pairs in the fetched window")]
    EmptyWindow,
}

/// Outcome of one pass over the configured satellites.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub updated: Vec<u32>,
    pub failed: Vec<(u32, PollError)>,
    pub elapsed: Duration,
}

/// Polls every configured satellite once per cycle and commits the derived
/// windows to the store.
pub struct Scheduler<S> {
    source: S,
    store: TelemetryStore,
    engine: MetricEngine,
    satellites: Vec<u32>,
    window_seconds: u32,
    pacing: PacingPolicy,
    state: PollState,
}

impl<S: PositionSource> Scheduler<S> {
    pub fn new(
        source: S,
        store: TelemetryStore,
        engine: MetricEngine,
        satellites: Vec<u32>,
        window_seconds: u32,
    ) -> Self {
        Self {
            source,
            store,
            engine,
            satellites,
            window_seconds,
            pacing: PacingPolicy::new(Duration::from_secs(window_seconds.into())),
            state: PollState::Idle,
        }
    }

    fn transition(&mut self, next: PollState) {
        log::debug!("scheduler: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// One pass over every satellite. A failing satellite keeps its previous
    /// series and never stops the others.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        for index in 0..self.satellites.len() {
            let catalog_id = self.satellites[index];
            match self.poll(catalog_id).await {
                Ok(()) => report.updated.push(catalog_id),
                Err(e) => {
                    log::warn!("satellite {}: {}; keeping previous series", catalog_id, e);
                    report.failed.push((catalog_id, e));
                }
            }
            self.transition(PollState::Idle);
        }

        report.elapsed = started.elapsed();
        report
    }

    async fn poll(&mut self, catalog_id: u32) -> Result<(), PollError> {
        self.transition(PollState::Fetching(catalog_id));
        let fetch_started = Instant::now();
        let pass = self
            .source
            .fetch(catalog_id, self.engine.observer(), self.window_seconds)
            .await?;
        let fetch_time = fetch_started.elapsed();

        self.transition(PollState::Deriving(catalog_id));
        let process_started = Instant::now();
        let metrics = self.engine.derive(&pass.observations);
        let process_time = process_started.elapsed();
        if metrics.is_empty() {
            return Err(PollError::EmptyWindow);
        }

        self.transition(PollState::Committing(catalog_id));
        let records = metrics.len();
        let series = SatelliteSeries::from_metrics(pass.id, self.window_seconds as usize, metrics);
        self.store.commit(
            series,
            CommitTimings {
                fetch_time,
                process_time,
                quota_used: pass.quota_used,
            },
        );
        log::debug!("satellite {}: committed {} records", catalog_id, records);
        Ok(())
    }

    /// Cycles until `shutdown` flips to true (or its sender goes away).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Polling {} satellites every {:?}",
            self.satellites.len(),
            self.pacing.window()
        );

        while !*shutdown.borrow() {
            let report = tokio::select! {
                report = self.run_cycle() => Some(report),
                _ = shutdown.changed() => None,
            };
            let Some(report) = report else {
                break;
            };

            log::info!(
                "Cycle done in {:?}: {} updated, {} failed",
                report.elapsed,
                report.updated.len(),
                report.failed.len()
            );

            let pause = self.pacing.sleep_after(report.elapsed);
            if self.pacing.overran(report.elapsed) {
                log::warn!(
                    "Cycle took {:?} against a {:?} window, starting the next one immediately",
                    report.elapsed,
                    self.pacing.window()
                );
            }

            self.transition(PollState::Sleeping(pause));
            let should_stop = tokio::select! {
                _ = sleep(pause) => false,
                _ = shutdown.changed() => true,
            };
            if should_stop {
                break;
            }
            self.transition(PollState::Idle);
        }

        self.transition(PollState::Idle);
        log::info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPass;
    use crate::geodesy::Geodetic;
    use crate::telemetry::{RawObservation, SatelliteId};
    use crate::testing::pass;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum Behavior {
        Pass(Vec<RawObservation>),
        Fail,
    }

    #[derive(Clone, Default)]
    struct MockSource {
        behaviors: Arc<Mutex<HashMap<u32, Behavior>>>,
        calls: Arc<Mutex<Vec<(u32, Instant)>>>,
        latency: Duration,
    }

    impl MockSource {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn set(&self, catalog_id: u32, behavior: Behavior) {
            self.behaviors.lock().unwrap().insert(catalog_id, behavior);
        }

        fn calls(&self) -> Vec<(u32, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PositionSource for MockSource {
        async fn fetch(
            &self,
            catalog_id: u32,
            _observer: &Geodetic,
            _seconds: u32,
        ) -> Result<FetchedPass, FetchError> {
            self.calls.lock().unwrap().push((catalog_id, Instant::now()));
            sleep(self.latency).await;

            let behavior = self.behaviors.lock().unwrap().get(&catalog_id).cloned();
            match behavior {
                Some(Behavior::Pass(observations)) => Ok(FetchedPass {
                    id: SatelliteId::new(catalog_id, format!("SAT {catalog_id}")),
                    observations,
                    quota_used: Some(catalog_id),
                }),
                _ => Err(FetchError::Api("unavailable".into())),
            }
        }
    }

    fn scheduler(source: MockSource, satellites: Vec<u32>, window: u32) -> Scheduler<MockSource> {
        let engine = MetricEngine::new(Geodetic::new(40.0, -74.0, 0.0));
        Scheduler::new(source, TelemetryStore::new(), engine, satellites, window)
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated_to_one_satellite() {
        let source = MockSource::default();
        source.set(1, Behavior::Pass(pass(0, 10)));
        source.set(2, Behavior::Fail);
        source.set(3, Behavior::Pass(pass(0, 10)));

        let mut scheduler = scheduler(source.clone(), vec![1, 2, 3], 300);
        let report = scheduler.run_cycle().await;

        assert_eq!(report.updated, vec![1, 3]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 2);
        assert!(matches!(report.failed[0].1, PollError::Fetch(_)));
        assert_eq!(scheduler.state, PollState::Idle);

        let snapshot = scheduler.store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(1).unwrap().len(), 9);
        assert!(snapshot.get(2).is_none());
        assert_eq!(snapshot.counters().quota_used, Some(3));
        let calls: Vec<_> = source.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_previous_series() {
        let source = MockSource::default();
        source.set(7, Behavior::Pass(pass(1_000, 5)));
        let mut scheduler = scheduler(source.clone(), vec![7], 300);

        scheduler.run_cycle().await;
        source.set(7, Behavior::Fail);
        let report = scheduler.run_cycle().await;

        assert_eq!(report.failed.len(), 1);
        let snapshot = scheduler.store.snapshot();
        let stale = snapshot.get(7).unwrap();
        assert_eq!(stale.len(), 4);
        assert_eq!(stale.id(), &SatelliteId::new(7, "SAT 7"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_window_keeps_previous_series() {
        let source = MockSource::default();
        source.set(7, Behavior::Pass(pass(1_000, 5)));
        let mut scheduler = scheduler(source.clone(), vec![7], 300);
        scheduler.run_cycle().await;

        source.set(7, Behavior::Pass(pass(2_000, 1)));
        let report = scheduler.run_cycle().await;

        assert!(matches!(report.failed[..], [(7, PollError::EmptyWindow)]));
        let snapshot = scheduler.store.snapshot();
        assert_eq!(snapshot.get(7).unwrap().iter().next().unwrap().timestamp, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_replaces_old_one() {
        let source = MockSource::default();
        source.set(7, Behavior::Pass(pass(1_000, 20)));
        let mut scheduler = scheduler(source.clone(), vec![7], 300);
        scheduler.run_cycle().await;

        source.set(7, Behavior::Pass(pass(5_000, 3)));
        scheduler.run_cycle().await;

        let snapshot = scheduler.store.snapshot();
        let stamps: Vec<_> = snapshot.get(7).unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![5_000, 5_001]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_series_capped_at_window() {
        let source = MockSource::default();
        source.set(9, Behavior::Pass(pass(0, 12)));
        let mut scheduler = scheduler(source, vec![9], 5);
        scheduler.run_cycle().await;

        let snapshot = scheduler.store.snapshot();
        let stamps: Vec<_> = snapshot.get(9).unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![6, 7, 8, 9, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counters_track_fetch_latency() {
        let source = MockSource::with_latency(Duration::from_secs(2));
        source.set(1, Behavior::Pass(pass(0, 3)));
        source.set(2, Behavior::Pass(pass(0, 3)));
        let mut scheduler = scheduler(source, vec![1, 2], 300);

        let report = scheduler.run_cycle().await;
        assert_eq!(report.elapsed, Duration::from_secs(4));
        let counters = *scheduler.store.snapshot().counters();
        assert_eq!(counters.fetch_time_total, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_are_paced_against_the_window() {
        let source = MockSource::with_latency(Duration::from_secs(2));
        source.set(1, Behavior::Pass(pass(0, 3)));
        source.set(2, Behavior::Fail);
        let scheduler = scheduler(source.clone(), vec![1, 2], 10);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(stop_rx));
        sleep(Duration::from_secs(20)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        let calls = source.calls();
        assert!(calls.len() >= 4, "{} calls", calls.len());
        let t0 = calls[0].1;
        // 4s of fetching, then 10 - 4 - 1 = 5s asleep
        assert_eq!(calls[1].1 - t0, Duration::from_secs(2));
        assert_eq!(calls[2].1 - t0, Duration::from_secs(9));
        assert_eq!(calls[3].1 - t0, Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_starts_next_cycle_immediately() {
        let source = MockSource::with_latency(Duration::from_secs(6));
        source.set(1, Behavior::Pass(pass(0, 3)));
        source.set(2, Behavior::Pass(pass(0, 3)));
        let scheduler = scheduler(source.clone(), vec![1, 2], 10);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(stop_rx));
        sleep(Duration::from_secs(15)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        let calls = source.calls();
        assert!(calls.len() >= 3);
        assert_eq!(calls[2].1 - calls[0].1, Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_shutdown() {
        let source = MockSource::default();
        source.set(1, Behavior::Pass(pass(0, 3)));
        let scheduler = scheduler(source.clone(), vec![1], 300);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(stop_rx));
        sleep(Duration::from_secs(1)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        // one cycle, then asleep until the stop signal
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_stopped_never_polls() {
        let source = MockSource::default();
        let scheduler = scheduler(source.clone(), vec![1], 300);
        let (_stop_tx, stop_rx) = watch::channel(true);
        scheduler.run(stop_rx).await;
        assert!(source.calls().is_empty());
    }
}
