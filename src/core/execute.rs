use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::core::assertion::run_assertions;
use crate::core::auth::AuthProvider;
use crate::core::resolver::Resolver;
use crate::core::transport::{PreparedRequest, ReqwestTransport, Transport};
use crate::error::TransportError;
use crate::models::collection::Request;
use crate::models::execution_result::ExecutionResult;
use crate::models::transport_config::TransportConfig;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Absent body sends nothing, strings go out verbatim, anything else as JSON.
pub fn body_to_bytes(body: Option<&Value>) -> Result<Vec<u8>, serde_json::Error> {
    match body {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s.clone().into_bytes()),
        Some(other) => serde_json::to_vec(other),
    }
}

/// Turns one request template into one `ExecutionResult`.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        RequestExecutor {
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Executor over a reqwest client built from `config`.
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(RequestExecutor {
            transport: Arc::new(transport),
            timeout: config.timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves url, headers, query and body, then applies auth.
    pub fn prepare(
        &self,
        request: &Request,
        resolver: &Resolver,
    ) -> Result<PreparedRequest, TransportError> {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), resolver.resolve(v)))
            .collect();
        // keep the wire order stable
        headers.sort();
        let mut query_params: Vec<(String, String)> = request
            .query_params
            .iter()
            .map(|(k, v)| (k.clone(), resolver.resolve(v)))
            .collect();
        query_params.sort();

        let body = request.body.as_ref().map(|b| resolver.resolve_body(b));
        let body = body_to_bytes(body.as_ref())
            .map_err(|e| TransportError::PrepareBody(e.to_string()))?;

        let mut prepared = PreparedRequest {
            method: request.method.clone(),
            url: resolver.resolve(&request.url),
            headers,
            query_params,
            body,
        };
        if !prepared.body.is_empty() && prepared.header("Content-Type").is_none() {
            prepared.set_header("Content-Type", "application/json");
        }

        if let Some(auth) = &request.auth {
            AuthProvider::from_auth(auth, resolver)?.apply(&mut prepared)?;
        }
        Ok(prepared)
    }

    pub async fn execute(&self, request: &Request, resolver: &Resolver) -> ExecutionResult {
        let start_time = OffsetDateTime::now_utc();

        let prepared = match self.prepare(request, resolver) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(request = %request.name, error = %e, "failed to prepare request");
                return ExecutionResult::failed(
                    request.clone(),
                    e,
                    start_time,
                    OffsetDateTime::now_utc(),
                );
            }
        };
        debug!(request = %request.name, method = %prepared.method, url = %prepared.url, "sending");

        let sent = tokio::time::timeout(self.timeout, self.transport.send(prepared, self.timeout)).await;
        let end_time = OffsetDateTime::now_utc();

        let response = match sent {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(request = %request.name, error = %e, "request failed");
                return ExecutionResult::failed(request.clone(), e, start_time, end_time);
            }
            Err(_) => {
                let e = TransportError::Timeout {
                    after: self.timeout,
                };
                warn!(request = %request.name, error = %e, "request failed");
                return ExecutionResult::failed(request.clone(), e, start_time, end_time);
            }
        };

        let (passed, failures) = run_assertions(request, &response);
        debug!(
            request = %request.name,
            status = response.status_code,
            passed,
            "request finished"
        );
        ExecutionResult {
            request: request.clone(),
            response,
            error: None,
            start_time,
            end_time,
            passed,
            failures,
        }
    }
}
