use std::path::PathBuf;

use clap::Parser;

use crate::models::AgentConfig;

/// CLI flags for the agent binary. These take precedence over both the TOML
/// file and environment overrides — the last word belongs to whoever
/// invoked the process.
#[derive(Parser, Debug)]
#[command(name = "logwarden-agent", about = "log capture and forwarding agent")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short = 'c', default_value = "/etc/logwarden/config.toml")]
    pub config: PathBuf,

    /// Override dispatcher.workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Override log_level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override metrics_addr (host:port), or "off" to disable the endpoint.
    #[arg(long)]
    pub metrics_addr: Option<String>,
}

impl Cli {
    pub fn apply(&self, config: &mut AgentConfig) {
        if let Some(workers) = self.workers {
            config.dispatcher.workers = workers;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(addr) = &self.metrics_addr {
            config.metrics_addr = if addr.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(addr.clone())
            };
        }
    }
}
