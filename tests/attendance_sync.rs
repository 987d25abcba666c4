#[path = "../src/attendance.rs"]
#[allow(dead_code)]
mod attendance;

use attendance::{StudentStatus, TeacherAttendance, TeacherStatus};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn staff(ids: &[(&str, &str)]) -> Vec<(String, String)> {
    ids.iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}

#[test]
fn new_day_starts_everyone_absent_in_staff_order() {
    let day = attendance::sync_teacher_day(&staff(&[("T02", "Jones"), ("T01", "Smith")]), Vec::new());
    assert_eq!(
        day,
        vec![
            TeacherAttendance::absent("T02", "Jones"),
            TeacherAttendance::absent("T01", "Smith"),
        ]
    );
}

#[test]
fn existing_records_survive_and_departed_teachers_drop() {
    let mut smith = TeacherAttendance::absent("T01", "Smith");
    smith.check_in("08:05 AM");
    let gone = TeacherAttendance::absent("T09", "Gone");

    let day = attendance::sync_teacher_day(
        &staff(&[("T01", "Smith"), ("T03", "Wilson")]),
        vec![gone, smith.clone()],
    );
    assert_eq!(day, vec![smith, TeacherAttendance::absent("T03", "Wilson")]);
}

#[test]
fn sync_is_stable_once_reconciled() {
    let roster = staff(&[("T01", "Smith"), ("T02", "Jones")]);
    let first = attendance::sync_teacher_day(&roster, Vec::new());
    let second = attendance::sync_teacher_day(&roster, first.clone());
    assert_eq!(first, second);
}

#[test]
fn check_in_keeps_first_time_and_clears_check_out() {
    let mut rec = TeacherAttendance::absent("T01", "Smith");
    rec.check_in("08:00 AM");
    rec.check_out("03:00 PM");
    assert_eq!(rec.status, TeacherStatus::CheckedOut);
    assert_eq!(rec.check_out_time.as_deref(), Some("03:00 PM"));

    rec.check_in("03:10 PM");
    assert_eq!(rec.status, TeacherStatus::Present);
    assert_eq!(rec.check_in_time.as_deref(), Some("08:00 AM"));
    assert_eq!(rec.check_out_time, None);
}

#[test]
fn summaries_count_each_status() {
    let mut a = TeacherAttendance::absent("T01", "A");
    a.check_in("08:00 AM");
    let mut b = TeacherAttendance::absent("T02", "B");
    b.check_in("08:00 AM");
    b.check_out("01:00 PM");
    let c = TeacherAttendance::absent("T03", "C");
    let summary = attendance::teacher_summary(&[a, b, c]);
    assert_eq!((summary.present, summary.absent, summary.checked_out), (1, 1, 1));

    let roster = vec!["S1".to_string(), "S2".to_string(), "S3".to_string(), "S4".to_string()];
    let mut marks = HashMap::new();
    marks.insert("S1".to_string(), StudentStatus::Present);
    marks.insert("S2".to_string(), StudentStatus::Late);
    marks.insert("S9".to_string(), StudentStatus::Absent);
    let s = attendance::student_summary(&roster, &marks);
    assert_eq!((s.present, s.absent, s.late, s.unmarked), (1, 0, 1, 2));
}

#[test]
fn status_names_round_trip_through_their_labels() {
    assert_eq!(TeacherStatus::parse("Checked Out"), Some(TeacherStatus::CheckedOut));
    assert_eq!(TeacherStatus::CheckedOut.as_str(), "Checked Out");
    assert_eq!(StudentStatus::parse("late"), None);
    assert_eq!(
        serde_json::to_value(TeacherStatus::CheckedOut).expect("serialize"),
        serde_json::json!("Checked Out")
    );
}

#[test]
fn dates_must_be_iso() {
    assert!(attendance::parse_date("2024-10-15").is_some());
    assert!(attendance::parse_date("15/10/2024").is_none());
    assert!(attendance::parse_date("2024-02-30").is_none());
}
