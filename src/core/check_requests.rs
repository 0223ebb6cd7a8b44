use std::collections::HashSet;
use std::str::FromStr;

use reqwest::Method;
use tracing::warn;

use crate::error::ConfigError;
use crate::models::collection::Request;

/// Rejects requests that can never be sent: empty url or a method that is not an HTTP token.
pub(crate) fn check_requests(requests: &[Request]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for (index, request) in requests.iter().enumerate() {
        if request.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl {
                index,
                name: request.name.clone(),
            });
        }
        if request.method.trim().is_empty()
            || Method::from_str(&request.method.to_uppercase()).is_err()
        {
            return Err(ConfigError::InvalidMethod {
                index,
                name: request.name.clone(),
                method: request.method.clone(),
            });
        }
        if !names.insert(request.name.as_str()) {
            warn!(name = %request.name, "duplicate request name");
        }
    }
    Ok(())
}
