use std::collections::VecDeque;

use serde::Serialize;

use crate::telemetry::{DerivedMetric, SatelliteId};

/// Bounded, oldest-evicted-first window of metrics for one satellite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteSeries {
    id: SatelliteId,
    capacity: usize,
    metrics: VecDeque<DerivedMetric>,
}

impl SatelliteSeries {
    pub fn new(id: SatelliteId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            metrics: VecDeque::with_capacity(capacity),
        }
    }

    pub fn from_metrics(
        id: SatelliteId,
        capacity: usize,
        metrics: impl IntoIterator<Item = DerivedMetric>,
    ) -> Self {
        let mut series = Self::new(id, capacity);
        for metric in metrics {
            series.push(metric);
        }
        series
    }

    pub fn push(&mut self, metric: DerivedMetric) {
        if self.capacity == 0 {
            return;
        }
        while self.metrics.len() >= self.capacity {
            self.metrics.pop_front();
        }
        self.metrics.push_back(metric);
    }

    pub fn id(&self) -> &SatelliteId {
        &self.id
    }

    #[allow(dead_code)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedMetric> {
        self.metrics.iter()
    }

    /// Latest record at or before `now`, or the oldest one if the whole
    /// window lies in the future.
    pub fn current_at(&self, now: i64) -> Option<&DerivedMetric> {
        match self.metrics.partition_point(|m| m.timestamp <= now) {
            0 => self.metrics.front(),
            idx => self.metrics.get(idx - 1),
        }
    }
}
