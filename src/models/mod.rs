pub mod args;
pub mod assert_error_stats;
pub mod collection;
pub mod execution_result;
pub mod extract;
pub mod http_error_stats;
pub mod load_config;
pub mod response;
pub mod result;
pub mod transport_config;
