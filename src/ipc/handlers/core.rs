use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        &req.id,
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        })),
    )
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(params, "path")?);
    let seed = params
        .get("seedDefaults")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let conn = db::open_db(&path).map_err(|e| HandlerErr::db("db_open_failed", e))?;
    let mut seeded = false;
    if seed && db::is_empty(&conn).map_err(|e| HandlerErr::db("db_query_failed", e))? {
        db::seed_defaults(&conn).map_err(|e| HandlerErr::db("db_insert_failed", e))?;
        seeded = true;
    }
    info!(workspace = %path.display(), seeded, "workspace selected");

    state.workspace = Some(path.clone());
    state.db = Some(conn);
    Ok(json!({ "workspacePath": path.to_string_lossy(), "seeded": seeded }))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = workspace_select(state, &req.params);
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
