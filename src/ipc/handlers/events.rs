use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{check_date, get_date, get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, EventCategory, SchoolEvent};
use serde_json::{json, Value};
use tracing::info;

fn parse_category(raw: &str) -> Result<EventCategory, HandlerErr> {
    EventCategory::parse(raw)
        .ok_or_else(|| HandlerErr::bad_params("category must be one of: Academic, Sports, Arts, Community"))
}

fn event_id(params: &Value) -> Result<i64, HandlerErr> {
    params
        .get("eventId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params("missing eventId"))
}

fn events_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let category = get_optional_str(params, "category")
        .map(|c| parse_category(&c))
        .transpose()?;
    let events = records::list_events(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let filtered = events
        .into_iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .collect::<Vec<_>>();
    Ok(json!({ "events": filtered }))
}

fn events_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let title = get_required_str(params, "title")?;
    let date = get_date(params)?;
    let category = parse_category(&get_required_str(params, "category")?)?;
    let description = get_required_str(params, "description")?;

    let id = records::next_event_id(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let event = SchoolEvent {
        id,
        title,
        date,
        description,
        category,
    };
    records::insert_event(conn, &event).map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "events" }))
    })?;
    info!(event_id = event.id, "event created");
    Ok(json!({ "event": event }))
}

fn events_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = event_id(params)?;
    let mut event = records::get_event(conn, id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::not_found("event not found").with_details(json!({ "eventId": id })))?;

    if let Some(v) = get_optional_str(params, "title") {
        event.title = v;
    }
    if let Some(v) = get_optional_str(params, "date") {
        event.date = check_date(&v)?;
    }
    if let Some(v) = get_optional_str(params, "category") {
        event.category = parse_category(&v)?;
    }
    if let Some(v) = get_optional_str(params, "description") {
        event.description = v;
    }

    records::update_event(conn, &event).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "event": event }))
}

fn events_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = event_id(params)?;
    let removed = records::delete_event(conn, id).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !removed {
        return Err(HandlerErr::not_found("event not found"));
    }
    info!(event_id = id, "event deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "events.list" => events_list(state, &req.params),
        "events.create" => events_create(state, &req.params),
        "events.update" => events_update(state, &req.params),
        "events.delete" => events_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
