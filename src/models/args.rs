use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Log request details
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every request of a collection once, in order
    Run {
        #[command(flatten)]
        target: Target,
    },
    /// Replay requests of a collection under concurrent load
    Load {
        #[command(flatten)]
        target: Target,

        /// Only load-test the request with this name
        #[arg(short, long)]
        request: Option<String>,

        /// Number of virtual users
        #[arg(short, long, default_value_t = 10)]
        users: usize,

        /// Run for this many seconds, takes precedence over --iterations
        #[arg(short, long, default_value_t = 0)]
        duration_secs: u64,

        /// Total number of requests when no duration is given
        #[arg(short, long, default_value_t = 100)]
        iterations: u64,

        /// Spread worker start-up over this many seconds
        #[arg(long, default_value_t = 0)]
        ramp_up_secs: u64,
    },
}

#[derive(ClapArgs, Debug)]
pub struct Target {
    /// Collection file (.yaml, .yml or .json)
    pub collection: PathBuf,

    /// Environment to use
    #[arg(short, long, env = "NEXUS_ENV", default_value = "dev")]
    pub env: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[arg(long, default_value_t = false)]
    pub insecure: bool,

    /// Force HTTP/1.1
    #[arg(long, default_value_t = false)]
    pub http1_only: bool,
}
