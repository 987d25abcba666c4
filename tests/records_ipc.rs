mod test_support;

use serde_json::json;
use test_support::{error_code, open_seeded, request, request_ok, spawn_sidecar};

fn ids(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|v| match &v["id"] {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

#[test]
fn courses_crud_with_code_conflict() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_seeded(&mut stdin, &mut reader, "schoold-records-courses");

    let listed = request_ok(&mut stdin, &mut reader, "1", "courses.list", json!({}));
    assert_eq!(ids(&listed["courses"]), vec!["C101", "C102", "C103", "C104", "C105"]);

    let by_teacher = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.list",
        json!({ "teacher": "Ms. Emily Jones" }),
    );
    assert_eq!(ids(&by_teacher["courses"]), vec!["C102", "C105"]);

    let searched = request_ok(&mut stdin, &mut reader, "3", "courses.list", json!({ "search": "hist" }));
    assert_eq!(ids(&searched["courses"]), vec!["C104"]);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.create",
        json!({ "name": "Chemistry", "code": "SCI-301", "teacher": "Ms. Emily Jones", "credits": "3" }),
    );
    assert_eq!(created["course"]["id"].as_str(), Some("C106"));
    assert_eq!(created["course"]["credits"].as_i64(), Some(3));

    let dup = request(
        &mut stdin,
        &mut reader,
        "5",
        "courses.create",
        json!({ "name": "Bio Again", "code": "SCI-101", "teacher": "Ms. Emily Jones", "credits": 4 }),
    );
    assert_eq!(error_code(&dup), Some("conflict"));

    let too_many_credits = request(
        &mut stdin,
        &mut reader,
        "6",
        "courses.create",
        json!({ "name": "Marathon", "code": "PE-900", "teacher": "Mr. David Smith", "credits": 6 }),
    );
    assert_eq!(error_code(&too_many_credits), Some("bad_params"));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "courses.update",
        json!({ "courseId": "C106", "credits": 5, "code": "IGNORED-1" }),
    );
    assert_eq!(updated["course"]["credits"].as_i64(), Some(5));
    assert_eq!(updated["course"]["name"].as_str(), Some("Chemistry"));
    assert_eq!(updated["course"]["code"].as_str(), Some("SCI-301"));

    let _ = request_ok(&mut stdin, &mut reader, "8", "courses.delete", json!({ "courseId": "C106" }));
    let gone = request(&mut stdin, &mut reader, "9", "courses.update", json!({ "courseId": "C106", "name": "X" }));
    assert_eq!(error_code(&gone), Some("not_found"));
}

#[test]
fn assessments_filter_and_validate() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_seeded(&mut stdin, &mut reader, "schoold-records-assessments");

    let quizzes = request_ok(&mut stdin, &mut reader, "1", "assessments.list", json!({ "type": "Quiz" }));
    assert_eq!(ids(&quizzes["assessments"]), vec!["A002", "A006"]);

    let window = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assessments.list",
        json!({ "startDate": "2024-05-12", "endDate": "2024-05-15" }),
    );
    assert_eq!(ids(&window["assessments"]), vec!["A002", "A003", "A006"]);

    let alice = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "assessments.list",
        json!({ "studentName": "Alice Johnson" }),
    );
    assert_eq!(ids(&alice["assessments"]), vec!["A001", "A003"]);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assessments.create",
        json!({
            "studentName": "Diana Miller",
            "courseName": "Biology",
            "type": "Project",
            "date": "2024-06-01",
            "score": 100
        }),
    );
    assert_eq!(created["assessment"]["id"].as_str(), Some("A007"));
    assert_eq!(created["assessment"]["type"].as_str(), Some("Project"));

    let bad_type = request(
        &mut stdin,
        &mut reader,
        "5",
        "assessments.create",
        json!({ "studentName": "Diana Miller", "courseName": "Biology", "type": "Exam", "score": 50 }),
    );
    assert_eq!(error_code(&bad_type), Some("bad_params"));

    let bad_score = request(
        &mut stdin,
        &mut reader,
        "6",
        "assessments.create",
        json!({ "studentName": "Diana Miller", "courseName": "Biology", "type": "Quiz", "score": 101 }),
    );
    assert_eq!(error_code(&bad_score), Some("bad_params"));

    let rescored = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "assessments.update",
        json!({ "assessmentId": "A007", "score": 97 }),
    );
    assert_eq!(rescored["assessment"]["score"].as_i64(), Some(97));
    assert_eq!(rescored["assessment"]["courseName"].as_str(), Some("Biology"));

    let _ = request_ok(&mut stdin, &mut reader, "8", "assessments.delete", json!({ "assessmentId": "A007" }));
    let again = request(&mut stdin, &mut reader, "9", "assessments.delete", json!({ "assessmentId": "A007" }));
    assert_eq!(error_code(&again), Some("not_found"));
}

#[test]
fn events_are_listed_in_date_order() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_seeded(&mut stdin, &mut reader, "schoold-records-events");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "events.create",
        json!({
            "title": "Orientation",
            "date": "2024-10-01",
            "category": "Community",
            "description": "Welcome session for new families."
        }),
    );
    assert_eq!(created["event"]["id"].as_i64(), Some(6));

    let listed = request_ok(&mut stdin, &mut reader, "2", "events.list", json!({}));
    assert_eq!(ids(&listed["events"]), vec!["6", "1", "2", "3", "4", "5"]);

    let academic = request_ok(&mut stdin, &mut reader, "3", "events.list", json!({ "category": "Academic" }));
    assert_eq!(ids(&academic["events"]), vec!["2", "5"]);

    let moved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "events.update",
        json!({ "eventId": 6, "date": "2024-12-01" }),
    );
    assert_eq!(moved["event"]["title"].as_str(), Some("Orientation"));
    let listed = request_ok(&mut stdin, &mut reader, "5", "events.list", json!({}));
    assert_eq!(ids(&listed["events"]).last().map(String::as_str), Some("6"));

    let bad_category = request(
        &mut stdin,
        &mut reader,
        "6",
        "events.create",
        json!({ "title": "Gala", "date": "2024-12-05", "category": "Party", "description": "x" }),
    );
    assert_eq!(error_code(&bad_category), Some("bad_params"));

    let _ = request_ok(&mut stdin, &mut reader, "7", "events.delete", json!({ "eventId": 6 }));
    let gone = request(&mut stdin, &mut reader, "8", "events.delete", json!({ "eventId": 6 }));
    assert_eq!(error_code(&gone), Some("not_found"));
}
