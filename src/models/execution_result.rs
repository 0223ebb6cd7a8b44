use std::time::Duration;

use time::OffsetDateTime;

use crate::error::TransportError;
use crate::models::collection::Request;
use crate::models::response::Response;

/// Outcome of executing one request.
///
/// `error` set means the call never completed: `response` is the zero value,
/// `passed` is false and `failures` is empty.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub request: Request,
    pub response: Response,
    pub error: Option<TransportError>,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub passed: bool,
    pub failures: Vec<String>,
}

impl ExecutionResult {
    pub(crate) fn failed(
        request: Request,
        error: TransportError,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Self {
        ExecutionResult {
            request,
            response: Response::default(),
            error: Some(error),
            start_time,
            end_time,
            passed: false,
            failures: Vec::new(),
        }
    }

    /// Completed without a transport error and with a status below 400.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.response.status_code < 400
    }

    /// Wall-clock span of resolve + dispatch + receive.
    pub fn wall_time(&self) -> Duration {
        (self.end_time - self.start_time)
            .try_into()
            .unwrap_or(Duration::ZERO)
    }
}
