//! CLI argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::MonitorConfig;
use crate::error::Result;

/// Watch a workspace root and report when its in-memory model must be reloaded
#[derive(Parser, Debug)]
#[command(name = "workspace-monitor")]
#[command(about = "Watch a workspace and report when the loaded model has gone stale")]
#[command(version)]
pub struct Cli {
    /// Workspace root directory to monitor
    pub root: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "WORKSPACE_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interval between reload assessments, in milliseconds (overrides config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Exit after this many reloads
    #[arg(long)]
    pub max_reloads: Option<usize>,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn load_config(&self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)?,
            None => MonitorConfig::default(),
        };
        if let Some(interval) = self.interval_ms {
            config.poll_interval_ms = interval;
        }
        Ok(config)
    }
}
