use std::time::Duration;

use prettytable::{format, row, Cell, Row, Table};

use crate::models::execution_result::ExecutionResult;
use crate::models::result::LoadTestResult;

fn ms(d: Duration) -> String {
    format!("{:.2}ms", d.as_secs_f64() * 1000.0)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table
}

pub fn load_result_table(result: &LoadTestResult) -> Table {
    let mut table = new_table();
    table.add_row(row!["Metric", "Value"]);
    table.add_row(row!["RPS", format!("{:.3}", result.rps)]);
    table.add_row(row!["Total requests", result.total_requests]);
    table.add_row(row!["Failed", result.failed_requests]);
    table.add_row(row!["Success rate", format!("{:.2}%", result.success_rate)]);
    table.add_row(row!["Duration", format!("{:.2}s", result.duration.as_secs_f64())]);
    table.add_row(row!["Avg latency", ms(result.avg_latency)]);
    table.add_row(row!["Min latency", ms(result.min_latency)]);
    table.add_row(row!["Max latency", ms(result.max_latency)]);
    table.add_row(row!["P50 latency", ms(result.p50_latency)]);
    table.add_row(row!["P95 latency", ms(result.p95_latency)]);
    table.add_row(row!["P99 latency", ms(result.p99_latency)]);
    table.add_row(row![
        "Throughput",
        format!("{:.2}kb/s", result.throughput_per_second_kb)
    ]);
    table
}

/// `None` when nothing went wrong.
pub fn http_errors_table(result: &LoadTestResult) -> Option<Table> {
    if result.http_errors.is_empty() {
        return None;
    }
    let mut table = new_table();
    table.add_row(row!["Code", "Message", "Count"]);
    for e in &result.http_errors {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{:03}", e.status_code)),
            Cell::new(&e.message).style_spec("R"),
            Cell::new(&e.count.to_string()),
        ]));
    }
    Some(table)
}

pub fn assert_errors_table(result: &LoadTestResult) -> Option<Table> {
    if result.assert_errors.is_empty() {
        return None;
    }
    let mut table = new_table();
    table.add_row(row!["Assertion", "Failures"]);
    for e in &result.assert_errors {
        table.add_row(row![e.assertion, e.count]);
    }
    Some(table)
}

fn outcome(result: &ExecutionResult) -> String {
    match &result.error {
        Some(e) => format!("ERROR: {}", e),
        None if result.passed => "PASS".to_string(),
        None => format!("FAIL: {}", result.failures.join("; ")),
    }
}

pub fn run_results_table(results: &[ExecutionResult]) -> Table {
    let mut table = new_table();
    table.add_row(row!["Request", "Method", "Status", "Time", "Size", "Result"]);
    for r in results {
        let status = if r.error.is_some() {
            "-".to_string()
        } else {
            r.response.status_code.to_string()
        };
        table.add_row(row![
            r.request.name,
            r.request.method.to_uppercase(),
            status,
            ms(r.response.elapsed),
            format!("{}B", r.response.size),
            outcome(r)
        ]);
    }
    table
}

pub fn show_load_result(name: &str, result: &LoadTestResult) {
    println!("Load test results for {}:", name);
    load_result_table(result).printstd();
    if let Some(table) = http_errors_table(result) {
        println!("HTTP errors:");
        table.printstd();
    }
    if let Some(table) = assert_errors_table(result) {
        println!("Assertion failures:");
        table.printstd();
    }
}

pub fn show_run_results(results: &[ExecutionResult]) {
    run_results_table(results).printstd();
    let passed = results.iter().filter(|r| r.passed).count();
    println!(
        "{} passed, {} failed, {} total",
        passed,
        results.len() - passed,
        results.len()
    );
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::error::TransportError;
    use crate::models::collection::Request;
    use crate::models::http_error_stats::HttpErrorCount;
    use crate::models::response::Response;

    #[test]
    fn load_table_lists_every_metric() {
        let result = LoadTestResult {
            total_requests: 10,
            success_rate: 90.0,
            p99_latency: Duration::from_millis(12),
            http_errors: vec![HttpErrorCount {
                status_code: 503,
                message: "503 Service Unavailable".to_string(),
                count: 1,
            }],
            ..Default::default()
        };
        let text = load_result_table(&result).to_string();
        assert!(text.contains("Total requests"));
        assert!(text.contains("90.00%"));
        assert!(text.contains("12.00ms"));

        let errors = http_errors_table(&result).unwrap().to_string();
        assert!(errors.contains("503 Service Unavailable"));
        assert!(assert_errors_table(&result).is_none());
    }

    #[test]
    fn run_table_shows_outcomes() {
        let now = OffsetDateTime::now_utc();
        let ok = ExecutionResult {
            request: Request::new("health", "get", "http://x"),
            response: Response {
                status_code: 200,
                ..Default::default()
            },
            error: None,
            start_time: now,
            end_time: now,
            passed: true,
            failures: Vec::new(),
        };
        let failed = ExecutionResult::failed(
            Request::new("down", "GET", "http://y"),
            TransportError::Connect("refused".to_string()),
            now,
            now,
        );
        let text = run_results_table(&[ok, failed]).to_string();
        assert!(text.contains("health"));
        assert!(text.contains("GET"));
        assert!(text.contains("PASS"));
        assert!(text.contains("ERROR: connection failed: refused"));
    }
}
