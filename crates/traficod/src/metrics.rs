//! Per-run outcome and latency accumulation

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::lookup::Outcome;

/// Running totals for a workload run
///
/// Incremental counters only; the immutable report is produced once by
/// [`MetricsCollector::finish`].
pub struct MetricsCollector {
    hits: u64,
    misses: u64,
    not_found: u64,
    errors: u64,
    cache_time: Duration,
    store_time: Duration,
    started: Instant,
}

impl MetricsCollector {
    /// Start collecting; elapsed time counts from here
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            not_found: 0,
            errors: 0,
            cache_time: Duration::ZERO,
            store_time: Duration::ZERO,
            started: Instant::now(),
        }
    }

    /// Record one lookup outcome
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Hit(latency) => {
                self.hits += 1;
                self.cache_time += *latency;
            }
            Outcome::Miss(latency) => {
                self.misses += 1;
                self.store_time += *latency;
            }
            Outcome::NotFound => self.not_found += 1,
        }
    }

    /// Record a request that failed outright
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Requests recorded so far
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses + self.not_found + self.errors
    }

    /// Finalize into an immutable report
    pub fn finish(self) -> MetricsReport {
        let total = self.total_requests();

        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        };

        let avg_cache_ms = if self.hits == 0 {
            0.0
        } else {
            self.cache_time.as_secs_f64() * 1000.0 / self.hits as f64
        };

        let avg_store_ms = if self.misses == 0 {
            0.0
        } else {
            self.store_time.as_secs_f64() * 1000.0 / self.misses as f64
        };

        MetricsReport {
            total_requests: total,
            cache_hits: self.hits,
            cache_misses: self.misses,
            not_found: self.not_found,
            errors: self.errors,
            hit_rate,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            avg_cache_ms,
            avg_store_ms,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Final numbers for a run, written out as the run artifact
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Requests issued, failed ones included
    pub total_requests: u64,
    /// Requests served from the cache
    pub cache_hits: u64,
    /// Requests served from the store
    pub cache_misses: u64,
    /// Requests matching no record
    pub not_found: u64,
    /// Requests that failed outright
    pub errors: u64,
    /// `100 * hits / total`, 0 for an empty run
    pub hit_rate: f64,
    /// Wall-clock duration of the run
    pub elapsed_secs: f64,
    /// Mean cache-read latency over hits
    pub avg_cache_ms: f64,
    /// Mean store-query latency over misses
    pub avg_store_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let mut metrics = MetricsCollector::new();

        metrics.record(&Outcome::Hit(Duration::from_millis(1)));
        metrics.record(&Outcome::Hit(Duration::from_millis(1)));
        metrics.record(&Outcome::Miss(Duration::from_millis(5)));
        metrics.record(&Outcome::NotFound);

        let report = metrics.finish();
        assert_eq!(report.total_requests, 4);
        assert_eq!(report.cache_hits, 2);
        assert!((report.hit_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run() {
        let report = MetricsCollector::new().finish();

        assert_eq!(report.total_requests, 0);
        assert_eq!(report.hit_rate, 0.0);
        assert_eq!(report.avg_cache_ms, 0.0);
        assert_eq!(report.avg_store_ms, 0.0);
    }

    #[test]
    fn test_branch_averages() {
        let mut metrics = MetricsCollector::new();

        metrics.record(&Outcome::Hit(Duration::from_millis(2)));
        metrics.record(&Outcome::Hit(Duration::from_millis(4)));
        metrics.record(&Outcome::Miss(Duration::from_millis(10)));

        let report = metrics.finish();
        assert!((report.avg_cache_ms - 3.0).abs() < 1e-6);
        assert!((report.avg_store_ms - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_errors_count_toward_total_not_hit_rate() {
        let mut metrics = MetricsCollector::new();

        metrics.record(&Outcome::Hit(Duration::from_millis(1)));
        metrics.record_error();

        let report = metrics.finish();
        assert_eq!(report.total_requests, 2);
        assert_eq!(report.errors, 1);
        assert!((report.hit_rate - 50.0).abs() < 1e-9);
    }
}
