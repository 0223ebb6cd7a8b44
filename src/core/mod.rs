pub mod assertion;
pub mod auth;
pub mod check_requests;
pub mod concurrency_controller;
pub mod execute;
pub mod extract;
pub mod functions;
pub mod load_engine;
pub mod metrics;
pub mod parser;
pub mod resolver;
pub mod runner;
pub mod show_result_with_table;
pub mod transport;
