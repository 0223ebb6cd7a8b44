use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::collection::Request;
use crate::models::response::Response;

lazy_static! {
    static ref STATUS: Regex = Regex::new(r"status\s*(==|!=|>=|<=|>|<)\s*(\d+)").unwrap();
    static ref BODY_CONTAINS: Regex = Regex::new(r#"body\.contains\("([^"]+)"\)"#).unwrap();
    static ref BODY_LENGTH: Regex =
        Regex::new(r"body\.length\s*(==|!=|>=|<=|>|<)\s*(\d+)").unwrap();
    static ref TIME: Regex = Regex::new(r"(?:response\.)?time\s*<\s*(\d+)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Comparator::Eq),
            "!=" => Some(Comparator::Ne),
            ">" => Some(Comparator::Gt),
            "<" => Some(Comparator::Lt),
            ">=" => Some(Comparator::Ge),
            "<=" => Some(Comparator::Le),
            _ => None,
        }
    }

    fn compare(self, actual: u64, expected: u64) -> bool {
        match self {
            Comparator::Eq => actual == expected,
            Comparator::Ne => actual != expected,
            Comparator::Gt => actual > expected,
            Comparator::Lt => actual < expected,
            Comparator::Ge => actual >= expected,
            Comparator::Le => actual <= expected,
        }
    }
}

/// Checks every assertion of `request` against `response`.
///
/// Returns `(passed, failures)`; a failure is the assertion text as written.
pub fn run_assertions(request: &Request, response: &Response) -> (bool, Vec<String>) {
    let failures: Vec<String> = request
        .all_assertions()
        .filter(|assertion| !evaluate(assertion, response))
        .cloned()
        .collect();
    (failures.is_empty(), failures)
}

/// Expressions that match no known shape pass.
// TODO: report malformed expressions such as "status >= " instead of passing them
pub fn evaluate(assertion: &str, response: &Response) -> bool {
    let assertion = assertion.trim();

    if assertion.contains("status") {
        return eval_status(assertion, response.status_code);
    }
    if assertion.contains("body") {
        return eval_body(assertion, response);
    }
    if assertion.contains("time") {
        return eval_time(assertion, response.elapsed);
    }
    true
}

fn comparison(re: &Regex, assertion: &str) -> Option<(Comparator, u64)> {
    let caps = re.captures(assertion)?;
    let op = Comparator::parse(&caps[1])?;
    // digits only, so parsing fails on overflow alone
    let expected = caps[2].parse().unwrap_or(u64::MAX);
    Some((op, expected))
}

fn eval_status(assertion: &str, status: u16) -> bool {
    match comparison(&STATUS, assertion) {
        Some((op, expected)) => op.compare(u64::from(status), expected),
        None => true,
    }
}

fn eval_body(assertion: &str, response: &Response) -> bool {
    if let Some(caps) = BODY_CONTAINS.captures(assertion) {
        return response.body_text().contains(&caps[1]);
    }
    match comparison(&BODY_LENGTH, assertion) {
        Some((op, expected)) => op.compare(response.body.len() as u64, expected),
        None => true,
    }
}

fn eval_time(assertion: &str, elapsed: Duration) -> bool {
    let threshold = TIME
        .captures(assertion)
        .map(|caps| caps[1].parse::<u64>().unwrap_or(u64::MAX));
    match threshold {
        Some(ms) => elapsed < Duration::from_millis(ms),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str, elapsed_ms: u64) -> Response {
        Response {
            status_code: status,
            status: format!("{} X", status),
            body: body.as_bytes().to_vec(),
            elapsed: Duration::from_millis(elapsed_ms),
            size: body.len() as u64,
            ..Default::default()
        }
    }

    fn request_with(tests: &[&str], assertions: &[&str]) -> Request {
        Request {
            tests: tests.iter().map(|s| s.to_string()).collect(),
            assertions: assertions.iter().map(|s| s.to_string()).collect(),
            ..Request::new("r", "GET", "http://x")
        }
    }

    #[test]
    fn status_comparators() {
        let resp = response(404, "", 1);
        assert!(!evaluate("status == 200", &resp));
        assert!(evaluate("status == 404", &resp));
        assert!(evaluate("status != 200", &resp));
        assert!(evaluate("status >= 400", &resp));
        assert!(evaluate("status <= 404", &resp));
        assert!(!evaluate("status < 400", &resp));
        assert!(evaluate("status>399", &resp));
    }

    #[test]
    fn body_contains_and_length() {
        let resp = response(200, r#"{"id":42}"#, 1);
        assert!(evaluate(r#"body.contains("42")"#, &resp));
        assert!(!evaluate(r#"body.contains("43")"#, &resp));
        assert!(evaluate("body.length == 9", &resp));
        assert!(evaluate("body.length > 3", &resp));
        assert!(!evaluate("body.length < 3", &resp));
    }

    #[test]
    fn time_threshold_is_strict() {
        let resp = response(200, "", 5);
        assert!(evaluate("time < 1000", &resp));
        assert!(evaluate("response.time < 1000", &resp));
        assert!(!evaluate("time < 1", &resp));
        assert!(!evaluate("time < 5", &resp));
        // only "<" is understood
        assert!(evaluate("time > 1000", &resp));
    }

    #[test]
    fn oversized_numbers_saturate() {
        let resp = response(200, "ok", 5);
        assert!(!evaluate("status == 99999999999999999999999", &resp));
        assert!(evaluate("status < 99999999999999999999999", &resp));
        assert!(!evaluate("body.length > 99999999999999999999999", &resp));
        assert!(evaluate("time < 99999999999999999999999", &resp));
    }

    #[test]
    fn body_contains_reads_lossy_text() {
        let mut resp = response(200, "", 1);
        resp.body = vec![b'o', b'k', 0xff, b'!'];
        assert!(evaluate(r#"body.contains("ok")"#, &resp));
        assert!(evaluate("body.length == 4", &resp));
    }

    #[test]
    fn unrecognised_shapes_pass() {
        let resp = response(500, "", 10_000);
        assert!(evaluate("foo bar", &resp));
        assert!(evaluate("status >= ", &resp));
        assert!(evaluate("body is nice", &resp));
        assert!(evaluate("   ", &resp));
    }

    #[test]
    fn failures_keep_original_text_and_order() {
        let resp = response(404, "missing", 5);
        let request = request_with(&["status == 200"], &["time < 1000", " body.length > 100"]);
        let (passed, failures) = run_assertions(&request, &resp);
        assert!(!passed);
        assert_eq!(failures, vec!["status == 200", " body.length > 100"]);
    }

    #[test]
    fn no_assertions_pass() {
        let (passed, failures) = run_assertions(&request_with(&[], &[]), &response(500, "", 1));
        assert!(passed);
        assert!(failures.is_empty());
    }
}
