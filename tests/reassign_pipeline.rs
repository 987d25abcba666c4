#[path = "../src/reassign.rs"]
mod reassign;

use pretty_assertions::assert_eq;
use reassign::{ImportError, Placement, Reassignment, RowError};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
struct Kid {
    id: String,
    grade: i64,
    class_name: String,
}

impl Placement for Kid {
    fn placement_id(&self) -> &str {
        &self.id
    }

    fn set_placement(&mut self, grade: i64, class_name: &str) {
        self.grade = grade;
        self.class_name = class_name.to_string();
    }
}

fn kid(id: &str, grade: i64, class_name: &str) -> Kid {
    Kid {
        id: id.to_string(),
        grade,
        class_name: class_name.to_string(),
    }
}

fn roster() -> Vec<Kid> {
    vec![kid("S001", 5, "5A"), kid("S002", 3, "3B"), kid("S003", 8, "8A")]
}

/// Plan against the roster's ids, then apply.
fn run(text: &str, roster: &[Kid]) -> Result<Vec<Kid>, ImportError> {
    let known: HashSet<String> = roster.iter().map(|k| k.id.clone()).collect();
    let updates = reassign::plan(text, &known)?;
    Ok(reassign::apply(roster, &updates))
}

fn messages(err: ImportError) -> Vec<String> {
    err.messages()
}

const HEADER: &str = "student_id,new_grade,new_class_name";

#[test]
fn single_valid_row_moves_student() {
    let out = run(&format!("{HEADER}\nS001,6,6B\n"), &roster()).expect("valid import");
    assert_eq!(out[0], kid("S001", 6, "6B"));
    assert_eq!(out[1..], roster()[1..]);
}

#[test]
fn unknown_student_rejects_whole_file() {
    let err = run(&format!("{HEADER}\nS999,6,6B"), &roster()).unwrap_err();
    assert_eq!(messages(err), vec![r#"Row 2: Student ID "S999" not found."#.to_string()]);
}

#[test]
fn grade_out_of_range_is_reported_verbatim() {
    let err = run(&format!("{HEADER}\nS001,13,6B"), &roster()).unwrap_err();
    assert_eq!(
        messages(err),
        vec![r#"Row 2: Invalid grade "13". Must be a number between 1 and 12."#.to_string()]
    );
}

#[test]
fn short_row_reports_column_count() {
    let err = run(&format!("{HEADER}\nS001,6"), &roster()).unwrap_err();
    assert_eq!(
        messages(err),
        vec!["Row 2: Invalid number of columns. Expected 3, got 2.".to_string()]
    );
}

#[test]
fn embedded_comma_breaks_column_count() {
    let err = run(&format!("{HEADER}\nS001,6,\"6,B\""), &roster()).unwrap_err();
    assert_eq!(
        err,
        ImportError::Rejected(vec![RowError::ColumnCount { row: 2, got: 4 }])
    );
}

#[test]
fn every_problem_in_every_row_is_collected() {
    let text = format!("{HEADER}\nS001,6,6B\n,0,\nS999,abc,7C\nS002,4\nS003,,8B\n");
    let err = run(&text, &roster()).unwrap_err();
    assert_eq!(
        messages(err),
        vec![
            "Row 3: 'student_id' cannot be empty.".to_string(),
            r#"Row 3: Invalid grade "0". Must be a number between 1 and 12."#.to_string(),
            "Row 3: 'new_class_name' cannot be empty.".to_string(),
            r#"Row 4: Student ID "S999" not found."#.to_string(),
            r#"Row 4: Invalid grade "abc". Must be a number between 1 and 12."#.to_string(),
            "Row 5: Invalid number of columns. Expected 3, got 2.".to_string(),
            "Row 6: 'new_grade' cannot be empty.".to_string(),
        ]
    );
}

#[test]
fn non_integer_grades_are_rejected() {
    let known: HashSet<String> = ["S001".to_string()].into_iter().collect();
    for raw in ["6.5", "6.0", "6th", "6abc", "twelve", "-1"] {
        let rows = [format!("S001,{raw},6B")];
        let rows: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let (updates, errors) = reassign::validate_rows(&rows, &known);
        assert!(updates.is_empty(), "{raw} should not queue an update");
        assert_eq!(
            errors,
            vec![RowError::InvalidGrade {
                row: 2,
                value: raw.to_string()
            }]
        );
    }
}

#[test]
fn header_must_match_exactly_and_in_order() {
    for header in [
        "student_id,new_class_name,new_grade",
        "student_id,new_grade",
        "student_id,new_grade,new_class_name,extra",
        "Student_ID,new_grade,new_class_name",
        "id,grade,class",
    ] {
        let text = format!("{header}\nS001,6,6B");
        assert_eq!(
            run(&text, &roster()).unwrap_err(),
            ImportError::InvalidHeader,
            "header {header:?}"
        );
    }
}

#[test]
fn header_fields_are_trimmed() {
    let text = " student_id , new_grade ,new_class_name \r\nS002, 4 , 4C \r\n";
    let out = run(text, &roster()).expect("trimmed header accepted");
    assert_eq!(out[1], kid("S002", 4, "4C"));
}

#[test]
fn byte_order_mark_before_header_is_ignored() {
    let text = "\u{feff}student_id,new_grade,new_class_name\r\nS001,6,6B\r\n";
    let out = run(text, &roster()).expect("BOM-prefixed export accepted");
    assert_eq!(out[0], kid("S001", 6, "6B"));

    let (header, rows) = reassign::split_rows(text).expect("rows");
    assert_eq!(header, HEADER);
    assert_eq!(rows, vec!["S001,6,6B"]);
}

#[test]
fn byte_order_mark_alone_is_empty_input() {
    assert_eq!(run("\u{feff}", &roster()).unwrap_err(), ImportError::EmptyInput);
}

#[test]
fn empty_and_blank_input_is_empty_input() {
    for text in ["", "\n\n", "   \n \r\n"] {
        let err = run(text, &roster()).unwrap_err();
        assert_eq!(err, ImportError::EmptyInput);
        assert_eq!(err.to_string(), "CSV file is empty.");
    }
}

#[test]
fn invalid_header_message_is_user_facing() {
    assert_eq!(
        ImportError::InvalidHeader.to_string(),
        "Invalid CSV header. Expected columns: student_id, new_grade, new_class_name"
    );
}

#[test]
fn blank_lines_do_not_count_toward_row_numbers() {
    let err = run(&format!("\n{HEADER}\n\nS001,6,6B\n\nS999,6,6B"), &roster()).unwrap_err();
    assert_eq!(messages(err), vec![r#"Row 3: Student ID "S999" not found."#.to_string()]);
}

#[test]
fn header_only_file_is_a_no_op() {
    let out = run(HEADER, &roster()).expect("no rows");
    assert_eq!(out, roster());
}

#[test]
fn duplicate_ids_resolve_to_the_last_row() {
    let text = format!("{HEADER}\nS001,6,6B\nS002,4,4A\nS001,7,7C");
    let out = run(&text, &roster()).expect("valid import");
    assert_eq!(out[0], kid("S001", 7, "7C"));
    assert_eq!(out[1], kid("S002", 4, "4A"));
    assert_eq!(out[2], kid("S003", 8, "8A"));
}

#[test]
fn applying_the_same_file_twice_is_idempotent() {
    let text = format!("{HEADER}\nS001,6,6B\nS003,9,9A");
    let once = run(&text, &roster()).expect("first pass");
    let twice = run(&text, &once).expect("second pass");
    assert_eq!(once, twice);
}

#[test]
fn plan_returns_updates_in_file_order() {
    let known: HashSet<String> = roster().into_iter().map(|k| k.id).collect();
    let updates = reassign::plan(&format!("{HEADER}\nS003, 9 ,9A\nS001,1,1A"), &known).expect("plan");
    assert_eq!(
        updates,
        vec![
            Reassignment {
                student_id: "S003".to_string(),
                new_grade: 9,
                new_class_name: "9A".to_string(),
            },
            Reassignment {
                student_id: "S001".to_string(),
                new_grade: 1,
                new_class_name: "1A".to_string(),
            },
        ]
    );
}

#[test]
fn row_error_metadata() {
    let e = RowError::UnknownStudent {
        row: 7,
        id: "S404".to_string(),
    };
    assert_eq!(e.row(), 7);
    assert_eq!(e.code(), "unknown_student");
    assert_eq!(ImportError::Rejected(vec![e]).code(), "rows_rejected");
}
