use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{redirect, Client, Method, Url};
use tracing::debug;

use crate::error::TransportError;
use crate::models::response::Response;
use crate::models::transport_config::TransportConfig;

/// A request after template resolution, ready to go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces any header with the same name, ignoring case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn set_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.query_params.retain(|(k, _)| *k != name);
        self.query_params.push((name, value.into()));
    }

    /// Url with query parameters appended.
    pub fn full_url(&self) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| TransportError::InvalidRequest(format!("url '{}': {}", self.url, e)))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &self.query_params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// Sends prepared requests. Implementations must be usable from many tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: PreparedRequest,
        timeout: Duration,
    ) -> Result<Response, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

pub(crate) fn default_user_agent() -> String {
    let info = os_info::get();
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        info.os_type(),
        info.version()
    )
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(default_user_agent);
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .map_err(|e| TransportError::InvalidRequest(format!("user agent: {}", e)))?,
        );

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.insecure);
        if !config.http2 {
            builder = builder.http1_only();
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Other(format!("build http client: {}", e)))?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: PreparedRequest,
        timeout: Duration,
    ) -> Result<Response, TransportError> {
        let start = Instant::now();
        let method = Method::from_str(&request.method.to_uppercase())
            .map_err(|_| TransportError::InvalidRequest(format!("method '{}'", request.method)))?;
        let url = request.full_url()?;

        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            let name = k
                .parse::<HeaderName>()
                .map_err(|e| TransportError::InvalidRequest(format!("header name '{}': {}", k, e)))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{}': {}", k, e)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;
        let status = response.status();
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?
            .to_vec();
        let elapsed = start.elapsed();
        debug!(status = status.as_u16(), bytes = body.len(), ?elapsed, "response received");

        Ok(Response {
            status_code: status.as_u16(),
            status: format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
            headers: response_headers,
            size: body.len() as u64,
            body,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = PreparedRequest::default();
        request.set_header("content-type", "text/plain");
        request.set_header("Content-Type", "application/json");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn full_url_appends_query() {
        let request = PreparedRequest {
            url: "http://localhost:8080/search?x=1".to_string(),
            query_params: vec![("q".to_string(), "a b".to_string())],
            ..Default::default()
        };
        assert_eq!(
            request.full_url().unwrap().as_str(),
            "http://localhost:8080/search?x=1&q=a+b"
        );
    }

    #[test]
    fn invalid_url_is_a_request_error() {
        let request = PreparedRequest {
            url: "{{baseUrl}}/users".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            request.full_url(),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn builds_client_from_config() {
        let config = TransportConfig {
            http2: false,
            insecure: true,
            ..Default::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
        assert!(default_user_agent().starts_with("nexus/"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let transport = ReqwestTransport::new(&TransportConfig::default()).unwrap();
        let request = PreparedRequest {
            method: "GET".to_string(),
            url: "http://127.0.0.1:1/".to_string(),
            ..Default::default()
        };
        let result = transport.send(request, Duration::from_secs(2)).await;
        assert!(result.is_err());
    }
}
