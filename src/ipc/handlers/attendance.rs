use crate::attendance::{self, StudentStatus, TeacherAttendance};
use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_date, get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// Loads the day's teacher records reconciled against current staff, persisting
/// the reconciled list whenever it differs from what was stored.
fn synced_teacher_day(conn: &Connection, date: &str) -> Result<Vec<TeacherAttendance>, HandlerErr> {
    let teachers = db::list_teachers(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let staff = teachers
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<Vec<_>>();
    let stored = db::teacher_day(conn, date).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let synced = attendance::sync_teacher_day(&staff, stored.clone());
    if synced != stored {
        debug!(date, records = synced.len(), "teacher attendance day resynced");
        db::replace_teacher_day(conn, date, &synced).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    }
    Ok(synced)
}

fn teachers_open(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let date = get_date(params)?;
    let records = synced_teacher_day(conn, &date)?;
    let summary = attendance::teacher_summary(&records);
    Ok(json!({ "date": date, "records": records, "summary": summary }))
}

fn teachers_stamp(
    state: &AppState,
    params: &Value,
    stamp: fn(&mut TeacherAttendance, &str),
) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let date = get_date(params)?;
    let teacher_id = get_required_str(params, "teacherId")?;
    let now = get_optional_str(params, "time").unwrap_or_else(attendance::clock_now);

    let mut records = synced_teacher_day(conn, &date)?;
    let Some(record) = records.iter_mut().find(|r| r.teacher_id == teacher_id) else {
        return Err(HandlerErr::not_found("teacher not found").with_details(json!({ "teacherId": teacher_id })));
    };
    stamp(record, &now);
    let record = record.clone();
    db::replace_teacher_day(conn, &date, &records).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "date": date, "record": record }))
}

fn parse_student_status(params: &Value) -> Result<StudentStatus, HandlerErr> {
    let raw = get_required_str(params, "status")?;
    StudentStatus::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params("status must be one of: Present, Absent, Late"))
}

fn resolve_class(conn: &Connection, params: &Value) -> Result<String, HandlerErr> {
    if let Some(class_name) = get_optional_str(params, "className") {
        return Ok(class_name);
    }
    let teacher_id = get_optional_str(params, "teacherId")
        .ok_or_else(|| HandlerErr::bad_params("missing className or teacherId"))?;
    db::class_for_teacher(conn, &teacher_id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| {
            HandlerErr::not_found("no class assigned to teacher").with_details(json!({ "teacherId": teacher_id }))
        })
}

fn students_open(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let date = get_date(params)?;
    let class_name = resolve_class(conn, params)?;
    let roster = db::students_in_class(conn, &class_name).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let statuses: HashMap<String, StudentStatus> =
        db::student_statuses(conn, &date).map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let ids = roster.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
    let summary = attendance::student_summary(&ids, &statuses);
    let rows = roster
        .iter()
        .map(|s| {
            json!({
                "studentId": s.id,
                "name": s.name,
                "status": statuses.get(&s.id).map(|st| st.as_str())
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({
        "date": date,
        "className": class_name,
        "students": rows,
        "summary": summary
    }))
}

fn students_mark(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let date = get_date(params)?;
    let student_id = get_required_str(params, "studentId")?;
    let status = parse_student_status(params)?;
    let exists = db::get_student(conn, &student_id).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    if exists.is_none() {
        return Err(HandlerErr::not_found("student not found").with_details(json!({ "studentId": student_id })));
    }
    db::upsert_student_statuses(conn, &date, std::slice::from_ref(&student_id), status)
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "date": date, "studentId": student_id, "status": status.as_str() }))
}

fn students_mark_all(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let date = get_date(params)?;
    let status = parse_student_status(params)?;
    let class_name = resolve_class(conn, params)?;
    let ids = db::students_in_class(conn, &class_name)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .into_iter()
        .map(|s| s.id)
        .collect::<Vec<_>>();
    db::upsert_student_statuses(conn, &date, &ids, status).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({
        "date": date,
        "className": class_name,
        "status": status.as_str(),
        "marked": ids.len()
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "attendance.teachers.open" => teachers_open(state, &req.params),
        "attendance.teachers.checkIn" => teachers_stamp(state, &req.params, TeacherAttendance::check_in),
        "attendance.teachers.checkOut" => teachers_stamp(state, &req.params, TeacherAttendance::check_out),
        "attendance.students.open" => students_open(state, &req.params),
        "attendance.students.mark" => students_mark(state, &req.params),
        "attendance.students.markAll" => students_mark_all(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
