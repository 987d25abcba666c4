use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{check_date, get_date, get_optional_str, get_required_int_in, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, Assessment, AssessmentType, MAX_SCORE};
use serde_json::{json, Value};
use tracing::info;

fn parse_kind(raw: &str) -> Result<AssessmentType, HandlerErr> {
    AssessmentType::parse(raw)
        .ok_or_else(|| HandlerErr::bad_params("type must be one of: Quiz, Test, Homework, Project"))
}

fn optional_date(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    get_optional_str(params, key).map(|d| check_date(&d)).transpose()
}

fn assessments_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let student_name = get_optional_str(params, "studentName");
    let course_name = get_optional_str(params, "courseName");
    let kind = get_optional_str(params, "type").map(|t| parse_kind(&t)).transpose()?;
    let search = get_optional_str(params, "search").map(|s| s.to_lowercase());
    let start = optional_date(params, "startDate")?;
    let end = optional_date(params, "endDate")?;

    let all = records::list_assessments(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let filtered = all
        .into_iter()
        .filter(|a| student_name.as_deref().map_or(true, |s| a.student_name == s))
        .filter(|a| course_name.as_deref().map_or(true, |c| a.course_name == c))
        .filter(|a| kind.map_or(true, |k| a.kind == k))
        .filter(|a| {
            search.as_deref().map_or(true, |q| {
                a.student_name.to_lowercase().contains(q)
                    || a.course_name.to_lowercase().contains(q)
                    || a.id.to_lowercase().contains(q)
            })
        })
        // YYYY-MM-DD compares correctly as text.
        .filter(|a| start.as_deref().map_or(true, |s| a.date.as_str() >= s))
        .filter(|a| end.as_deref().map_or(true, |e| a.date.as_str() <= e))
        .collect::<Vec<_>>();
    Ok(json!({ "assessments": filtered }))
}

fn assessments_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let student_name = get_required_str(params, "studentName")?;
    let course_name = get_required_str(params, "courseName")?;
    let kind = parse_kind(&get_required_str(params, "type")?)?;
    let date = get_date(params)?;
    let score = get_required_int_in(params, "score", 0, MAX_SCORE)?;

    let id = records::next_assessment_id(conn).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let assessment = Assessment {
        id,
        student_name,
        course_name,
        kind,
        date,
        score,
    };
    records::insert_assessment(conn, &assessment).map_err(|e| {
        HandlerErr::db("db_insert_failed", e).with_details(json!({ "table": "assessments" }))
    })?;
    info!(assessment_id = %assessment.id, "assessment recorded");
    Ok(json!({ "assessment": assessment }))
}

fn assessments_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "assessmentId")?;
    let mut assessment = records::get_assessment(conn, &id)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::not_found("assessment not found").with_details(json!({ "assessmentId": id })))?;

    if let Some(v) = get_optional_str(params, "studentName") {
        assessment.student_name = v;
    }
    if let Some(v) = get_optional_str(params, "courseName") {
        assessment.course_name = v;
    }
    if let Some(v) = get_optional_str(params, "type") {
        assessment.kind = parse_kind(&v)?;
    }
    if let Some(v) = optional_date(params, "date")? {
        assessment.date = v;
    }
    if params.get("score").is_some() {
        assessment.score = get_required_int_in(params, "score", 0, MAX_SCORE)?;
    }

    records::update_assessment(conn, &assessment).map_err(|e| HandlerErr::db("db_update_failed", e))?;
    Ok(json!({ "assessment": assessment }))
}

fn assessments_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = state.conn()?;
    let id = get_required_str(params, "assessmentId")?;
    let removed = records::delete_assessment(conn, &id).map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if !removed {
        return Err(HandlerErr::not_found("assessment not found"));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "assessments.list" => assessments_list(state, &req.params),
        "assessments.create" => assessments_create(state, &req.params),
        "assessments.update" => assessments_update(state, &req.params),
        "assessments.delete" => assessments_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
