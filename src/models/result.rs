use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::assert_error_stats::AssertErrorCount;
use crate::models::http_error_stats::HttpErrorCount;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadTestResult {
    // 总请求数
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    // 运行时间
    pub duration: Duration,
    pub rps: f64,
    // 成功率(%)
    pub success_rate: f64,
    pub avg_latency: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub p50_latency: Duration,
    pub p95_latency: Duration,
    pub p99_latency: Duration,
    // 总响应数据量
    pub total_bytes: u64,
    pub throughput_per_second_kb: f64,
    pub http_errors: Vec<HttpErrorCount>,
    pub assert_errors: Vec<AssertErrorCount>,
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl fmt::Display for LoadTestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Load Test Results:")?;
        writeln!(f, "  Total Requests: {}", self.total_requests)?;
        writeln!(
            f,
            "  Success: {} ({:.2}%)",
            self.success_requests,
            percent(self.success_requests, self.total_requests)
        )?;
        writeln!(
            f,
            "  Failed: {} ({:.2}%)",
            self.failed_requests,
            percent(self.failed_requests, self.total_requests)
        )?;
        writeln!(f, "  Duration: {:?}", self.duration)?;
        writeln!(f, "  RPS: {:.2}", self.rps)?;
        writeln!(f, "  Avg Latency: {:?}", self.avg_latency)?;
        writeln!(f, "  Min Latency: {:?}", self.min_latency)?;
        writeln!(f, "  Max Latency: {:?}", self.max_latency)?;
        writeln!(f, "  P50 Latency: {:?}", self.p50_latency)?;
        writeln!(f, "  P95 Latency: {:?}", self.p95_latency)?;
        write!(f, "  P99 Latency: {:?}", self.p99_latency)
    }
}

impl LoadTestResult {
    pub(crate) fn success_percent(success: u64, total: u64) -> f64 {
        percent(success, total)
    }
}
