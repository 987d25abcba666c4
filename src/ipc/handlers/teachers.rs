use crate::db::{self, Teacher};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherPatch {
    name: Option<String>,
    subject: Option<String>,
    hire_date: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    qualifications: Option<String>,
    image_url: Option<String>,
}

impl TeacherPatch {
    fn parse(params: &Value) -> Result<Self, HandlerErr> {
        serde_json::from_value(params.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid teacher fields: {e}")))
    }

    fn apply(self, t: &mut Teacher) {
        if let Some(v) = self.name {
            t.name = v.trim().to_string();
        }
        if let Some(v) = self.subject {
            t.subject = v;
        }
        if let Some(v) = self.hire_date {
            t.hire_date = v;
        }
        if let Some(v) = self.email {
            t.email = v;
        }
        if let Some(v) = self.phone {
            t.phone = v;
        }
        if let Some(v) = self.qualifications {
            t.qualifications = v;
        }
        if self.image_url.is_some() {
            t.image_url = self.image_url;
        }
    }
}

fn parse_teacher(params: &Value) -> Result<Teacher, HandlerErr> {
    let mut t: Teacher = serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid teacher fields: {e}")))?;
    t.id = t.id.trim().to_string();
    t.name = t.name.trim().to_string();
    if t.id.is_empty() {
        return Err(HandlerErr::bad_params("id must not be empty"));
    }
    if t.name.is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    Ok(t)
}

fn teachers_list(state: &AppState) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let teachers = db::list_teachers(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok(json!({ "teachers": teachers }))
}

fn teachers_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let teacher = parse_teacher(params)?;
    let existing = db::get_teacher(conn, &teacher.id).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    if existing.is_some() {
        return Err(HandlerErr::new("conflict", "teacher id already exists")
            .with_details(json!({ "teacherId": teacher.id })));
    }
    db::insert_teacher(conn, &teacher).map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "teachers" }))
    })?;
    info!(teacher_id = %teacher.id, "teacher created");
    Ok(json!({ "teacher": teacher }))
}

fn teachers_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "teacherId")?;
    let mut teacher = db::get_teacher(conn, &id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::not_found("teacher not found").with_details(json!({ "teacherId": id })))?;
    TeacherPatch::parse(params)?.apply(&mut teacher);
    if teacher.name.is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    db::update_teacher(conn, &teacher).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "teacher": teacher }))
}

fn teachers_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "teacherId")?;
    let removed = db::delete_teacher(conn, &id).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !removed {
        return Err(HandlerErr::not_found("teacher not found"));
    }
    info!(teacher_id = %id, "teacher deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "teachers.list" => teachers_list(state),
        "teachers.create" => teachers_create(state, &req.params),
        "teachers.update" => teachers_update(state, &req.params),
        "teachers.delete" => teachers_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
