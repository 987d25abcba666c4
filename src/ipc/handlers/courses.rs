use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_int_in, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, Course, MAX_CREDITS, MIN_CREDITS};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Editable course fields. The code is fixed once the course exists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoursePatch {
    name: Option<String>,
    teacher: Option<String>,
}

impl CoursePatch {
    fn parse(params: &Value) -> Result<Self, HandlerErr> {
        serde_json::from_value(params.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid course fields: {e}")))
    }

    fn apply(self, c: &mut Course) {
        if let Some(v) = self.name {
            c.name = v.trim().to_string();
        }
        if let Some(v) = self.teacher {
            c.teacher = v.trim().to_string();
        }
    }
}

fn load_course(state: &AppState, id: &str) -> Result<Course, HandlerErr> {
    let conn = state.conn()?;
    records::get_course(conn, id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::not_found("course not found").with_details(json!({ "courseId": id })))
}

fn courses_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let teacher = get_optional_str(params, "teacher");
    let search = get_optional_str(params, "search").map(|s| s.to_lowercase());

    let courses = records::list_courses(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let filtered = courses
        .into_iter()
        .filter(|c| teacher.as_deref().map_or(true, |t| c.teacher == t))
        .filter(|c| {
            search.as_deref().map_or(true, |q| {
                c.name.to_lowercase().contains(q) || c.code.to_lowercase().contains(q)
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({ "courses": filtered }))
}

fn courses_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let name = get_required_str(params, "name")?;
    let code = get_required_str(params, "code")?;
    let teacher = get_required_str(params, "teacher")?;
    let credits = get_required_int_in(params, "credits", MIN_CREDITS, MAX_CREDITS)?;

    let taken = records::course_code_taken(conn, &code).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    if taken {
        return Err(HandlerErr::new("conflict", "course code already exists").with_details(json!({ "code": code })));
    }
    let id = records::next_course_id(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let course = Course {
        id,
        name,
        code,
        teacher,
        credits,
    };
    records::insert_course(conn, &course).map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "courses" }))
    })?;
    info!(course_id = %course.id, "course created");
    Ok(json!({ "course": course }))
}

fn courses_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "courseId")?;
    let mut course = load_course(state, &id)?;
    if params.get("credits").is_some() {
        course.credits = get_required_int_in(params, "credits", MIN_CREDITS, MAX_CREDITS)?;
    }
    CoursePatch::parse(params)?.apply(&mut course);
    if course.name.is_empty() || course.teacher.is_empty() {
        return Err(HandlerErr::bad_params("name and teacher must not be empty"));
    }
    let conn = state.conn()?;
    records::update_course(conn, &course).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "course": course }))
}

fn courses_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "courseId")?;
    let removed = records::delete_course(conn, &id).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !removed {
        return Err(HandlerErr::not_found("course not found"));
    }
    info!(course_id = %id, "course deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "courses.list" => courses_list(state, &req.params),
        "courses.create" => courses_create(state, &req.params),
        "courses.update" => courses_update(state, &req.params),
        "courses.delete" => courses_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
