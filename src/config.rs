use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "SCHOOLD_WORKSPACE";
pub const LOG_ENV: &str = "SCHOOLD_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened before the first request is read.
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let workspace = std::env::var(WORKSPACE_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let log_filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self {
            workspace,
            log_filter,
        }
    }
}

pub fn init_logging(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    // stdout carries responses; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
