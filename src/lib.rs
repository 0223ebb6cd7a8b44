pub mod core;
pub mod error;
pub mod logger;
pub mod models;

pub use crate::core::auth::AuthProvider;
pub use crate::core::execute::RequestExecutor;
pub use crate::core::extract::{JsonpathExtractor, VariableExtractor};
pub use crate::core::load_engine::LoadEngine;
pub use crate::core::metrics::Metrics;
pub use crate::core::parser::{parse_file, parse_json, parse_yaml, save_file};
pub use crate::core::resolver::Resolver;
pub use crate::core::runner::Runner;
pub use crate::core::transport::{PreparedRequest, ReqwestTransport, Transport};
pub use crate::error::{AuthError, ConfigError, LoadError, TransportError};
pub use crate::models::collection::{Auth, Collection, Environment, Request};
pub use crate::models::execution_result::ExecutionResult;
pub use crate::models::load_config::LoadConfig;
pub use crate::models::response::Response;
pub use crate::models::result::LoadTestResult;
pub use crate::models::transport_config::TransportConfig;
