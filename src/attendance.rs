use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const CLOCK_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherStatus {
    Present,
    Absent,
    #[serde(rename = "Checked Out")]
    CheckedOut,
}

impl TeacherStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TeacherStatus::Present => "Present",
            TeacherStatus::Absent => "Absent",
            TeacherStatus::CheckedOut => "Checked Out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(TeacherStatus::Present),
            "Absent" => Some(TeacherStatus::Absent),
            "Checked Out" => Some(TeacherStatus::CheckedOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    Present,
    Absent,
    Late,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Present => "Present",
            StudentStatus::Absent => "Absent",
            StudentStatus::Late => "Late",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(StudentStatus::Present),
            "Absent" => Some(StudentStatus::Absent),
            "Late" => Some(StudentStatus::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAttendance {
    pub teacher_id: String,
    pub teacher_name: String,
    pub status: TeacherStatus,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
}

impl TeacherAttendance {
    pub fn absent(teacher_id: &str, teacher_name: &str) -> Self {
        Self {
            teacher_id: teacher_id.to_string(),
            teacher_name: teacher_name.to_string(),
            status: TeacherStatus::Absent,
            check_in_time: None,
            check_out_time: None,
        }
    }

    pub fn check_in(&mut self, now: &str) {
        self.status = TeacherStatus::Present;
        if self.check_in_time.is_none() {
            self.check_in_time = Some(now.to_string());
        }
        self.check_out_time = None;
    }

    pub fn check_out(&mut self, now: &str) {
        self.status = TeacherStatus::CheckedOut;
        self.check_out_time = Some(now.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub present: usize,
    pub absent: usize,
    pub checked_out: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub unmarked: usize,
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

pub fn clock_now() -> String {
    Local::now().format(CLOCK_FORMAT).to_string()
}

/// One record per current teacher, in staff order. Existing records survive untouched,
/// missing teachers start Absent, and records for departed teachers are dropped.
pub fn sync_teacher_day(
    teachers: &[(String, String)],
    existing: Vec<TeacherAttendance>,
) -> Vec<TeacherAttendance> {
    let mut by_teacher: HashMap<String, TeacherAttendance> = existing
        .into_iter()
        .map(|rec| (rec.teacher_id.clone(), rec))
        .collect();
    teachers
        .iter()
        .map(|(id, name)| {
            by_teacher
                .remove(id)
                .unwrap_or_else(|| TeacherAttendance::absent(id, name))
        })
        .collect()
}

pub fn teacher_summary(records: &[TeacherAttendance]) -> TeacherSummary {
    records
        .iter()
        .fold(TeacherSummary::default(), |mut acc, rec| {
            match rec.status {
                TeacherStatus::Present => acc.present += 1,
                TeacherStatus::Absent => acc.absent += 1,
                TeacherStatus::CheckedOut => acc.checked_out += 1,
            }
            acc
        })
}

pub fn student_summary(
    roster: &[String],
    statuses: &HashMap<String, StudentStatus>,
) -> StudentSummary {
    let mut summary = StudentSummary::default();
    for id in roster {
        match statuses.get(id) {
            Some(StudentStatus::Present) => summary.present += 1,
            Some(StudentStatus::Absent) => summary.absent += 1,
            Some(StudentStatus::Late) => summary.late += 1,
            None => summary.unmarked += 1,
        }
    }
    summary
}
