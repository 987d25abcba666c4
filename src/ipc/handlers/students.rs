use crate::attendance;
use crate::db::{self, Student};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_grade, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentPatch {
    name: Option<String>,
    class_name: Option<String>,
    enrollment_date: Option<String>,
    guardian: Option<String>,
    date_of_birth: Option<String>,
    address: Option<String>,
    guardian_phone: Option<String>,
    image_url: Option<String>,
}

impl StudentPatch {
    fn parse(params: &Value) -> Result<Self, HandlerErr> {
        serde_json::from_value(params.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid student fields: {e}")))
    }

    fn apply(self, s: &mut Student) {
        if let Some(v) = self.name {
            s.name = v.trim().to_string();
        }
        if let Some(v) = self.class_name {
            s.class_name = v.trim().to_string();
        }
        if let Some(v) = self.enrollment_date {
            s.enrollment_date = v;
        }
        if let Some(v) = self.guardian {
            s.guardian = v;
        }
        if let Some(v) = self.date_of_birth {
            s.date_of_birth = v;
        }
        if let Some(v) = self.address {
            s.address = v;
        }
        if let Some(v) = self.guardian_phone {
            s.guardian_phone = v;
        }
        if self.image_url.is_some() {
            s.image_url = self.image_url;
        }
    }
}

fn check_required(s: &Student) -> Result<(), HandlerErr> {
    if s.name.is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    if s.class_name.is_empty() {
        return Err(HandlerErr::bad_params("className must not be empty"));
    }
    Ok(())
}

fn load_student(conn: &rusqlite::Connection, id: &str) -> Result<Student, HandlerErr> {
    db::get_student(conn, id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::not_found("student not found").with_details(json!({ "studentId": id })))
}

fn students_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let class_name = get_optional_str(params, "className");
    let grade = params.get("grade").and_then(|v| v.as_i64());
    let search = get_optional_str(params, "search").map(|s| s.to_lowercase());

    let students = db::list_students(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let filtered = students
        .into_iter()
        .filter(|s| class_name.as_deref().map_or(true, |c| s.class_name == c))
        .filter(|s| grade.map_or(true, |g| s.grade == g))
        .filter(|s| {
            search.as_deref().map_or(true, |q| {
                s.name.to_lowercase().contains(q) || s.id.to_lowercase().contains(q)
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({ "students": filtered }))
}

fn students_get(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "studentId")?;
    Ok(json!({ "student": load_student(conn, &id)? }))
}

fn students_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let grade = get_required_grade(params, "grade")?;
    let patch = StudentPatch::parse(params)?;
    let id = db::next_student_id(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let mut student = Student {
        id,
        name: String::new(),
        grade,
        class_name: String::new(),
        enrollment_date: attendance::today(),
        guardian: String::new(),
        date_of_birth: String::new(),
        address: String::new(),
        guardian_phone: String::new(),
        image_url: None,
    };
    patch.apply(&mut student);
    check_required(&student)?;

    db::insert_student(conn, &student).map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "students" }))
    })?;
    info!(student_id = %student.id, "student created");
    Ok(json!({ "student": student }))
}

fn students_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "studentId")?;
    let mut student = load_student(conn, &id)?;
    if params.get("grade").is_some() {
        student.grade = get_required_grade(params, "grade")?;
    }
    StudentPatch::parse(params)?.apply(&mut student);
    check_required(&student)?;

    db::update_student(conn, &student).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "student": student }))
}

fn students_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "studentId")?;
    let removed = db::delete_student(conn, &id).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !removed {
        return Err(HandlerErr::not_found("student not found"));
    }
    info!(student_id = %id, "student deleted");
    Ok(json!({ "ok": true }))
}

/// Single-student reassignment from the class management screen.
fn students_move(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "studentId")?;
    let grade = get_required_grade(params, "grade")?;
    let class_name = get_required_str(params, "className")?;
    let mut student = load_student(conn, &id)?;
    student.grade = grade;
    student.class_name = class_name;

    db::commit_placements(conn, std::slice::from_ref(&student))
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "student": student }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.get" => students_get(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        "students.move" => students_move(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
