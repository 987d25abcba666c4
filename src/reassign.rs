use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

pub const HEADER_FIELDS: [&str; 3] = ["student_id", "new_grade", "new_class_name"];
pub const MIN_GRADE: i64 = 1;
pub const MAX_GRADE: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
    pub student_id: String,
    pub new_grade: i64,
    pub new_class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row {row}: Invalid number of columns. Expected 3, got {got}.")]
    ColumnCount { row: usize, got: usize },
    #[error("Row {row}: '{field}' cannot be empty.")]
    EmptyField { row: usize, field: &'static str },
    #[error("Row {row}: Student ID \"{id}\" not found.")]
    UnknownStudent { row: usize, id: String },
    #[error("Row {row}: Invalid grade \"{value}\". Must be a number between 1 and 12.")]
    InvalidGrade { row: usize, value: String },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::ColumnCount { row, .. }
            | RowError::EmptyField { row, .. }
            | RowError::UnknownStudent { row, .. }
            | RowError::InvalidGrade { row, .. } => *row,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RowError::ColumnCount { .. } => "column_count",
            RowError::EmptyField { .. } => "empty_field",
            RowError::UnknownStudent { .. } => "unknown_student",
            RowError::InvalidGrade { .. } => "invalid_grade",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("CSV file is empty.")]
    EmptyInput,
    #[error("Invalid CSV header. Expected columns: student_id, new_grade, new_class_name")]
    InvalidHeader,
    #[error("{} row(s) failed validation", .0.len())]
    Rejected(Vec<RowError>),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::EmptyInput => "empty_input",
            ImportError::InvalidHeader => "invalid_header",
            ImportError::Rejected(_) => "rows_rejected",
        }
    }

    /// Messages in the order the user should see them.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ImportError::Rejected(errors) => errors.iter().map(|e| e.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

/// A roster record whose grade and class can be reassigned.
pub trait Placement: Clone {
    fn placement_id(&self) -> &str;
    fn set_placement(&mut self, grade: i64, class_name: &str);
}

/// Splits raw text into the header line and the non-blank data rows.
/// A leading byte-order mark is ignored.
pub fn split_rows(text: &str) -> Result<(&str, Vec<&str>), ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split('\n').map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next().ok_or(ImportError::EmptyInput)?;
    Ok((header, lines.collect()))
}

pub fn check_header(line: &str) -> Result<(), ImportError> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.as_slice() != HEADER_FIELDS {
        return Err(ImportError::InvalidHeader);
    }
    Ok(())
}

fn parse_grade(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|g| (MIN_GRADE..=MAX_GRADE).contains(g))
}

/// Checks every row and never stops early. Row numbers count the header as row 1.
pub fn validate_rows(
    rows: &[&str],
    known_ids: &HashSet<String>,
) -> (Vec<Reassignment>, Vec<RowError>) {
    let mut updates = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in rows.iter().enumerate() {
        let row = index + 2;
        let values: Vec<&str> = line.split(',').collect();
        if values.len() != HEADER_FIELDS.len() {
            errors.push(RowError::ColumnCount {
                row,
                got: values.len(),
            });
            continue;
        }

        let student_id = values[0].trim();
        let grade_raw = values[1].trim();
        let class_name = values[2].trim();
        let before = errors.len();

        if student_id.is_empty() {
            errors.push(RowError::EmptyField {
                row,
                field: HEADER_FIELDS[0],
            });
        } else if !known_ids.contains(student_id) {
            errors.push(RowError::UnknownStudent {
                row,
                id: student_id.to_string(),
            });
        }

        let grade = parse_grade(grade_raw);
        if grade_raw.is_empty() {
            errors.push(RowError::EmptyField {
                row,
                field: HEADER_FIELDS[1],
            });
        } else if grade.is_none() {
            errors.push(RowError::InvalidGrade {
                row,
                value: grade_raw.to_string(),
            });
        }

        if class_name.is_empty() {
            errors.push(RowError::EmptyField {
                row,
                field: HEADER_FIELDS[2],
            });
        }

        if errors.len() == before {
            if let Some(new_grade) = grade {
                updates.push(Reassignment {
                    student_id: student_id.to_string(),
                    new_grade,
                    new_class_name: class_name.to_string(),
                });
            }
        }
    }

    (updates, errors)
}

/// Parses and validates a whole file. Returns the queued updates only when no row failed.
pub fn plan(text: &str, known_ids: &HashSet<String>) -> Result<Vec<Reassignment>, ImportError> {
    let (header, rows) = split_rows(text)?;
    check_header(header)?;
    let (updates, errors) = validate_rows(&rows, known_ids);
    if !errors.is_empty() {
        return Err(ImportError::Rejected(errors));
    }
    Ok(updates)
}

/// Applies updates in file order, so a repeated student id ends with its last row.
pub fn apply<P: Placement>(roster: &[P], updates: &[Reassignment]) -> Vec<P> {
    let mut next = roster.to_vec();
    for update in updates {
        for record in next.iter_mut() {
            if record.placement_id() == update.student_id {
                record.set_placement(update.new_grade, &update.new_class_name);
            }
        }
    }
    next
}
