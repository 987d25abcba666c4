mod attendance;
mod backup;
mod config;
mod db;
mod ipc;
mod reassign;
mod records;

use std::io::{self, BufRead, Write};
use tracing::{debug, error, info};

fn main() {
    let cfg = config::Config::from_env();
    config::init_logging(&cfg.log_filter);
    info!(version = env!("CARGO_PKG_VERSION"), "schoold starting");

    let mut state = ipc::AppState {
        workspace: None,
        db: None,
    };
    if let Some(path) = cfg.workspace {
        match db::open_db(&path) {
            Ok(conn) => {
                info!(workspace = %path.display(), "opened workspace from environment");
                state.workspace = Some(path);
                state.db = Some(conn);
            }
            Err(e) => error!(workspace = %path.display(), "failed to open workspace: {e:#}"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                debug!("bad request line: {e}");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, shutting down");
}
