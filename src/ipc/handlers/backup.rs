use crate::backup;
use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{error, info, warn};

fn workspace_path(state: &AppState, params: &Value) -> Result<PathBuf, HandlerErr> {
    params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone())
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn backup_export(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let out_path = get_required_str(params, "outPath")?;
    let workspace = workspace_path(state, params)?;

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let export = backup::export_workspace_bundle(&workspace, &PathBuf::from(&out_path))
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path })))?;
    info!(path = %out_path, sha256 = %export.db_sha256, "workspace bundle exported");
    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "dbSha256": export.db_sha256
    }))
}

/// Restores the handle dropped for a failed import; the file on disk is unchanged.
fn reopen_previous(state: &mut AppState, previous: Option<PathBuf>) {
    let Some(path) = previous else {
        return;
    };
    match db::open_db(&path) {
        Ok(conn) => state.db = Some(conn),
        Err(e) => {
            error!(workspace = %path.display(), "failed to reopen workspace: {e:#}");
            state.workspace = None;
        }
    }
}

fn backup_import(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let in_path = get_required_str(params, "inPath")?;
    let workspace = workspace_path(state, params)?;
    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::not_found("bundle file not found").with_details(json!({ "path": in_path })));
    }

    // Drop open handle before replacing file.
    let previous = state.workspace.clone();
    state.db = None;

    let import = match backup::import_workspace_bundle(&src, &workspace) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %in_path, "workspace bundle rejected: {e:#}");
            reopen_previous(state, previous);
            return Err(HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": in_path })));
        }
    };
    let conn = db::open_db(&workspace).map_err(|e| HandlerErr::db("db_open_failed", e))?;
    state.workspace = Some(workspace.clone());
    state.db = Some(conn);
    info!(path = %in_path, format = %import.bundle_format_detected, "workspace bundle imported");
    Ok(json!({
        "workspacePath": workspace.to_string_lossy(),
        "bundleFormatDetected": import.bundle_format_detected,
        "checksumVerified": import.checksum_verified
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => backup_export(state, &req.params),
        "backup.importWorkspaceBundle" => backup_import(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
