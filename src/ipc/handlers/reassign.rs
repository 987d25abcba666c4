use crate::db::{self, Student};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::read_csv_input;
use crate::ipc::types::{AppState, Request};
use crate::reassign::{self, ImportError, Reassignment};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{info, warn};

struct Outcome {
    path: Option<String>,
    roster: Vec<Student>,
    planned: Result<Vec<Reassignment>, ImportError>,
}

fn plan_from_params(state: &AppState, params: &Value) -> Result<Outcome, HandlerErr> {
    let conn = state.conn()?;
    let (text, path) = read_csv_input(params)?;
    let roster = db::list_students(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let known_ids: HashSet<String> = roster.iter().map(|s| s.id.clone()).collect();
    let planned = reassign::plan(&text, &known_ids);
    Ok(Outcome {
        path,
        roster,
        planned,
    })
}

fn error_json(e: &ImportError) -> Value {
    let rows = match e {
        ImportError::Rejected(errors) => errors
            .iter()
            .map(|r| json!({ "row": r.row(), "code": r.code(), "message": r.to_string() }))
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    json!({
        "reason": e.code(),
        "errors": e.messages(),
        "rowErrors": rows
    })
}

fn reassign_preview(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let outcome = plan_from_params(state, params)?;
    match outcome.planned {
        Ok(updates) => Ok(json!({
            "path": outcome.path,
            "valid": true,
            "updates": updates,
            "errors": []
        })),
        Err(e) => {
            let mut body = error_json(&e);
            body["path"] = json!(outcome.path);
            body["valid"] = json!(false);
            body["updates"] = json!([]);
            Ok(body)
        }
    }
}

fn reassign_apply(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let outcome = plan_from_params(state, params)?;
    let updates = match outcome.planned {
        Ok(v) => v,
        Err(e) => {
            warn!(reason = e.code(), problems = e.messages().len(), "class reassignment rejected");
            let message = e.messages().first().cloned().unwrap_or_else(|| e.to_string());
            return Err(HandlerErr::new("import_rejected", message).with_details(error_json(&e)));
        }
    };

    let next = reassign::apply(&outcome.roster, &updates);
    let named: HashSet<&str> = updates.iter().map(|u| u.student_id.as_str()).collect();
    let changed = next
        .into_iter()
        .filter(|s| named.contains(s.id.as_str()))
        .collect::<Vec<_>>();

    let conn = state.conn()?;
    db::commit_placements(conn, &changed).map_err(|e| HandlerErr::db("db_commit_failed", e))?;
    info!(
        rows = updates.len(),
        students = changed.len(),
        "class reassignment applied"
    );
    Ok(json!({
        "path": outcome.path,
        "rowsApplied": updates.len(),
        "studentsUpdated": changed.len(),
        "students": changed
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "classes.reassign.preview" => reassign_preview(state, &req.params),
        "classes.reassign.apply" => reassign_apply(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
