use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn settings_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = state.conn()?;
    let school_name = db::school_name(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok(json!({ "schoolName": school_name }))
}

fn settings_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = state.conn()?;
    let school_name = get_required_str(params, "schoolName")?;
    db::settings_set_json(conn, "schoolName", &json!(school_name))
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "schoolName": school_name }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(respond(&req.id, settings_get(state))),
        "settings.update" => Some(respond(&req.id, settings_update(state, &req.params))),
        _ => None,
    }
}
