use crate::model::{AgentKind, ClientConfig};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "agent-desk",
    version,
    about = "Terminal client for the agent service"
)]
pub struct Cli {
    /// Base URL of the agent backend
    #[arg(long, env = "AGENT_DESK_API_BASE", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// How often to poll backend status
    #[arg(long, env = "AGENT_DESK_POLL_INTERVAL", default_value = "5s")]
    pub poll_interval: humantime::Duration,

    /// Number of log lines to request per log stream
    #[arg(long, default_value_t = 200)]
    pub log_limit: usize,

    /// Application root; generated files live in `<app root>/outputs`
    #[arg(long, env = "AGENT_DESK_APP_ROOT")]
    pub app_root: Option<PathBuf>,

    /// Write logs to this file (defaults to the user cache directory)
    #[arg(long, env = "AGENT_DESK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Agent selected at startup
    #[arg(long, value_enum, default_value_t = AgentKind::JobMachine)]
    pub agent: AgentKind,
}

/// Build the process-wide client configuration from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    let app_root = args
        .app_root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    ClientConfig {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        poll_interval: Duration::from(args.poll_interval),
        log_limit: args.log_limit,
        outputs_dir: app_root.join("outputs"),
        user_agent: format!("agent-desk/{}", env!("CARGO_PKG_VERSION")),
        initial_agent: args.agent,
    }
}

/// Resolve where log output goes; `None` means discard.
pub fn resolve_log_path(args: &Cli) -> Option<PathBuf> {
    args.log_file
        .clone()
        .or_else(|| dirs::cache_dir().map(|d| d.join("agent-desk").join("agent-desk.log")))
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::debug!(
        config = %serde_json::to_string(&cfg).unwrap_or_default(),
        "starting"
    );
    crate::tui::run(cfg).await
}
