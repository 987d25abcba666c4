use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Classes are derived from the roster; an assignment row only names the class teacher.
fn classes_list(state: &AppState) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let students = db::list_students(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let assignments = db::class_assignments(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let teachers = db::list_teachers(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;

    // Grade is taken from the first student seen in the class.
    let mut by_class: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for s in &students {
        by_class
            .entry(s.class_name.clone())
            .or_insert((s.grade, 0))
            .1 += 1;
    }
    let mut classes = by_class.into_iter().collect::<Vec<_>>();
    classes.sort_by(|(a_name, (a_grade, _)), (b_name, (b_grade, _))| {
        a_grade.cmp(b_grade).then_with(|| a_name.cmp(b_name))
    });

    let rows = classes
        .into_iter()
        .map(|(class_name, (grade, student_count))| {
            let teacher_id = assignments.get(&class_name).cloned();
            let teacher_name = teacher_id
                .as_deref()
                .and_then(|id| teachers.iter().find(|t| t.id == id))
                .map(|t| t.name.clone());
            json!({
                "className": class_name,
                "grade": grade,
                "studentCount": student_count,
                "teacherId": teacher_id,
                "teacherName": teacher_name
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({ "classes": rows }))
}

fn classes_assign_teacher(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let class_name = get_required_str(params, "className")?;
    let teacher_id = get_optional_str(params, "teacherId");

    if let Some(id) = teacher_id.as_deref() {
        let exists = db::get_teacher(conn, id).map_err(|e| HandlerErr::db("db_query_failed", e))?;
        if exists.is_none() {
            return Err(HandlerErr::not_found("teacher not found").with_details(json!({ "teacherId": id })));
        }
    }
    db::set_class_teacher(conn, &class_name, teacher_id.as_deref())
        .map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "className": class_name, "teacherId": teacher_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "classes.list" => classes_list(state),
        "classes.assignTeacher" => classes_assign_teacher(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
