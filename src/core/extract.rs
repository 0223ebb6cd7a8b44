use jsonpath_lib::select;
use serde_json::Value;
use tracing::debug;

use crate::core::resolver::Resolver;
use crate::models::collection::Request;
use crate::models::response::Response;

/// Hook run after each successful request of a collection run, so later
/// requests can refer to values pulled from earlier responses.
pub trait VariableExtractor: Send + Sync {
    fn extract(&self, request: &Request, response: &Response, resolver: &mut Resolver);
}

/// Binds the first match of each `extract` rule. Requests without rules are untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonpathExtractor;

impl VariableExtractor for JsonpathExtractor {
    fn extract(&self, request: &Request, response: &Response, resolver: &mut Resolver) {
        if request.extract.is_empty() {
            return;
        }
        let json: Value = match serde_json::from_slice(&response.body) {
            Ok(json) => json,
            Err(e) => {
                debug!(request = %request.name, error = %e, "response body is not json, nothing extracted");
                return;
            }
        };
        for rule in &request.extract {
            match select(&json, &rule.jsonpath) {
                Ok(matches) => match matches.first() {
                    Some(Value::String(s)) => resolver.set_variable(rule.key.clone(), s.clone()),
                    Some(other) => resolver.set_variable(rule.key.clone(), other.to_string()),
                    None => {
                        debug!(request = %request.name, jsonpath = %rule.jsonpath, "jsonpath matched nothing")
                    }
                },
                Err(e) => {
                    debug!(request = %request.name, jsonpath = %rule.jsonpath, error = %e, "jsonpath query failed")
                }
            }
        }
    }
}
