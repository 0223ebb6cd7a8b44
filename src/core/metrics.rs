use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::models::assert_error_stats::AssertErrorStats;
use crate::models::execution_result::ExecutionResult;
use crate::models::http_error_stats::HttpErrorStats;
use crate::models::result::LoadTestResult;

/// Shared by every worker of one load run.
///
/// Counters, latency sum, min and max are atomics; min/max use a
/// compare-and-swap retry loop so a concurrent smaller/larger sample is never
/// overwritten. Individual latencies sit behind a read/write lock because
/// percentiles need the full sample.
pub struct Metrics {
    total_requests: AtomicU64,
    success_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_nanos: AtomicU64,
    min_latency_nanos: AtomicU64,
    max_latency_nanos: AtomicU64,
    total_bytes: AtomicU64,
    latencies: RwLock<Vec<Duration>>,
    http_errors: HttpErrorStats,
    assert_errors: AssertErrorStats,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// `floor(p * n)`, clamped to the last index. `sorted` must be ascending.
pub(crate) fn percentile_of(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            total_requests: AtomicU64::new(0),
            success_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_nanos: AtomicU64::new(0),
            min_latency_nanos: AtomicU64::new(u64::MAX),
            max_latency_nanos: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            http_errors: HttpErrorStats::new(),
            assert_errors: AssertErrorStats::new(),
        }
    }

    pub fn record(&self, result: &ExecutionResult) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if result.is_success() {
            self.success_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        match &result.error {
            Some(e) => self.http_errors.increment(0, e.to_string()),
            None if result.response.status_code >= 400 => self
                .http_errors
                .increment(result.response.status_code, result.response.status.clone()),
            None => {}
        }
        for failure in &result.failures {
            self.assert_errors.increment(failure);
        }
        self.total_bytes
            .fetch_add(result.response.size, Ordering::Relaxed);

        // a failed call has no response timing, fall back to the wall clock
        let latency = if result.error.is_some() {
            result.wall_time()
        } else {
            result.response.elapsed
        };
        self.record_latency(latency);
    }

    pub fn record_latency(&self, latency: Duration) {
        let value = nanos(latency);
        self.total_latency_nanos.fetch_add(value, Ordering::Relaxed);

        let mut current = self.min_latency_nanos.load(Ordering::Relaxed);
        while value < current {
            match self.min_latency_nanos.compare_exchange_weak(
                current,
                value,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let mut current = self.max_latency_nanos.load(Ordering::Relaxed);
        while value > current {
            match self.max_latency_nanos.compare_exchange_weak(
                current,
                value,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.latencies.write().push(latency);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn min_latency(&self) -> Duration {
        match self.min_latency_nanos.load(Ordering::Relaxed) {
            u64::MAX => Duration::ZERO,
            n => Duration::from_nanos(n),
        }
    }

    pub fn max_latency(&self) -> Duration {
        Duration::from_nanos(self.max_latency_nanos.load(Ordering::Relaxed))
    }

    pub fn avg_latency(&self) -> Duration {
        match self.total_requests() {
            0 => Duration::ZERO,
            total => Duration::from_nanos(self.total_latency_nanos.load(Ordering::Relaxed) / total),
        }
    }

    pub fn percentile(&self, p: f64) -> Duration {
        let mut sorted = self.latencies.read().clone();
        sorted.sort_unstable();
        percentile_of(&sorted, p)
    }

    pub fn summarize(&self, elapsed: Duration) -> LoadTestResult {
        let total = self.total_requests();
        let success = self.success_requests.load(Ordering::Relaxed);
        let total_bytes = self.total_bytes.load(Ordering::Relaxed);
        let secs = elapsed.as_secs_f64();

        let mut sorted = self.latencies.read().clone();
        sorted.sort_unstable();

        LoadTestResult {
            total_requests: total,
            success_requests: success,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            duration: elapsed,
            rps: if secs > 0.0 { total as f64 / secs } else { 0.0 },
            success_rate: LoadTestResult::success_percent(success, total),
            avg_latency: self.avg_latency(),
            min_latency: self.min_latency(),
            max_latency: self.max_latency(),
            p50_latency: percentile_of(&sorted, 0.50),
            p95_latency: percentile_of(&sorted, 0.95),
            p99_latency: percentile_of(&sorted, 0.99),
            total_bytes,
            throughput_per_second_kb: if secs > 0.0 {
                total_bytes as f64 / 1024.0 / secs
            } else {
                0.0
            },
            http_errors: self.http_errors.snapshot(),
            assert_errors: self.assert_errors.snapshot(),
        }
    }
}
