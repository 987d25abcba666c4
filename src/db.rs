use crate::attendance::{StudentStatus, TeacherAttendance, TeacherStatus};
use crate::reassign::Placement;
use crate::records;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE: &str = "school.sqlite3";
pub const DEFAULT_SCHOOL_NAME: &str = "Katamanso KKMA 2 JHS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub grade: i64,
    pub class_name: String,
    #[serde(default)]
    pub enrollment_date: String,
    #[serde(default)]
    pub guardian: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub guardian_phone: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Placement for Student {
    fn placement_id(&self) -> &str {
        &self.id
    }

    fn set_placement(&mut self, grade: i64, class_name: &str) {
        self.grade = grade;
        self.class_name = class_name.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub hire_date: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub qualifications: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(workspace.join(DB_FILE))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            grade INTEGER NOT NULL,
            class_name TEXT NOT NULL,
            enrollment_date TEXT NOT NULL DEFAULT '',
            guardian TEXT NOT NULL DEFAULT '',
            date_of_birth TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            guardian_phone TEXT NOT NULL DEFAULT '',
            image_url TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            hire_date TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            qualifications TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_assignments(
            class_name TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teacher_attendance(
            date TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            teacher_name TEXT NOT NULL,
            position INTEGER NOT NULL,
            status TEXT NOT NULL,
            check_in_time TEXT,
            check_out_time TEXT,
            PRIMARY KEY(date, teacher_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_attendance(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(student_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_attendance_date ON student_attendance(date)",
        [],
    )?;
    records::ensure_tables(&conn)?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("setting {key} is not valid JSON"))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

pub fn school_name(conn: &Connection) -> anyhow::Result<String> {
    Ok(settings_get_json(conn, "schoolName")?
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()))
}

const STUDENT_COLUMNS: &str = "id, name, grade, class_name, enrollment_date, guardian, date_of_birth, address, guardian_phone, image_url";

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        grade: r.get(2)?,
        class_name: r.get(3)?,
        enrollment_date: r.get(4)?,
        guardian: r.get(5)?,
        date_of_birth: r.get(6)?,
        address: r.get(7)?,
        guardian_phone: r.get(8)?,
        image_url: r.get(9)?,
    })
}

pub fn list_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_student(conn: &Connection, id: &str) -> anyhow::Result<Option<Student>> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?");
    Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
}

pub fn students_in_class(conn: &Connection, class_name: &str) -> anyhow::Result<Vec<Student>> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE class_name = ? ORDER BY name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([class_name], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// `S` followed by the highest numeric suffix plus one, zero-padded to three digits.
pub fn next_student_id(conn: &Connection) -> anyhow::Result<String> {
    let mut stmt = conn.prepare("SELECT id FROM students")?;
    let ids = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let highest = ids
        .iter()
        .filter_map(|id| id.get(1..).and_then(|n| n.parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    Ok(format!("S{:03}", highest + 1))
}

pub fn insert_student(conn: &Connection, s: &Student) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO students(id, name, grade, class_name, enrollment_date, guardian, date_of_birth, address, guardian_phone, image_url)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            s.id,
            s.name,
            s.grade,
            s.class_name,
            s.enrollment_date,
            s.guardian,
            s.date_of_birth,
            s.address,
            s.guardian_phone,
            s.image_url
        ],
    )?;
    Ok(())
}

pub fn update_student(conn: &Connection, s: &Student) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE students
         SET name = ?, grade = ?, class_name = ?, enrollment_date = ?, guardian = ?,
             date_of_birth = ?, address = ?, guardian_phone = ?, image_url = ?
         WHERE id = ?",
        rusqlite::params![
            s.name,
            s.grade,
            s.class_name,
            s.enrollment_date,
            s.guardian,
            s.date_of_birth,
            s.address,
            s.guardian_phone,
            s.image_url,
            s.id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_student(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM student_attendance WHERE student_id = ?", [id])?;
    let removed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(removed > 0)
}

/// Writes grade and class for every given student in one transaction.
pub fn commit_placements(conn: &Connection, students: &[Student]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut written = 0usize;
    {
        let mut stmt = tx.prepare("UPDATE students SET grade = ?, class_name = ? WHERE id = ?")?;
        for s in students {
            written += stmt.execute((s.grade, &s.class_name, &s.id))?;
        }
    }
    tx.commit()?;
    Ok(written)
}

const TEACHER_COLUMNS: &str = "id, name, subject, hire_date, email, phone, qualifications, image_url";

fn teacher_from_row(r: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: r.get(0)?,
        name: r.get(1)?,
        subject: r.get(2)?,
        hire_date: r.get(3)?,
        email: r.get(4)?,
        phone: r.get(5)?,
        qualifications: r.get(6)?,
        image_url: r.get(7)?,
    })
}

pub fn list_teachers(conn: &Connection) -> anyhow::Result<Vec<Teacher>> {
    let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers ORDER BY sort_order, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_teacher(conn: &Connection, id: &str) -> anyhow::Result<Option<Teacher>> {
    let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = ?");
    Ok(conn.query_row(&sql, [id], teacher_from_row).optional()?)
}

pub fn insert_teacher(conn: &Connection, t: &Teacher) -> anyhow::Result<()> {
    let next_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM teachers",
        [],
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT INTO teachers(id, name, subject, hire_date, email, phone, qualifications, image_url, sort_order)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            t.id,
            t.name,
            t.subject,
            t.hire_date,
            t.email,
            t.phone,
            t.qualifications,
            t.image_url,
            next_order
        ],
    )?;
    Ok(())
}

pub fn update_teacher(conn: &Connection, t: &Teacher) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE teachers
         SET name = ?, subject = ?, hire_date = ?, email = ?, phone = ?, qualifications = ?, image_url = ?
         WHERE id = ?",
        rusqlite::params![
            t.name,
            t.subject,
            t.hire_date,
            t.email,
            t.phone,
            t.qualifications,
            t.image_url,
            t.id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_teacher(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM class_assignments WHERE teacher_id = ?", [id])?;
    let removed = tx.execute("DELETE FROM teachers WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(removed > 0)
}

pub fn class_assignments(conn: &Connection) -> anyhow::Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT class_name, teacher_id FROM class_assignments")?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

pub fn set_class_teacher(
    conn: &Connection,
    class_name: &str,
    teacher_id: Option<&str>,
) -> anyhow::Result<()> {
    match teacher_id {
        Some(t) => {
            conn.execute(
                "INSERT INTO class_assignments(class_name, teacher_id) VALUES(?, ?)
                 ON CONFLICT(class_name) DO UPDATE SET teacher_id = excluded.teacher_id",
                (class_name, t),
            )?;
        }
        None => {
            conn.execute(
                "DELETE FROM class_assignments WHERE class_name = ?",
                [class_name],
            )?;
        }
    }
    Ok(())
}

/// First class (by name) the teacher is assigned to.
pub fn class_for_teacher(conn: &Connection, teacher_id: &str) -> anyhow::Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT class_name FROM class_assignments WHERE teacher_id = ? ORDER BY class_name LIMIT 1",
            [teacher_id],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn teacher_day(conn: &Connection, date: &str) -> anyhow::Result<Vec<TeacherAttendance>> {
    let mut stmt = conn.prepare(
        "SELECT teacher_id, teacher_name, status, check_in_time, check_out_time
         FROM teacher_attendance
         WHERE date = ?
         ORDER BY position",
    )?;
    let rows = stmt
        .query_map([date], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
                r.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(teacher_id, teacher_name, status, check_in_time, check_out_time)| -> anyhow::Result<TeacherAttendance> {
            let status = TeacherStatus::parse(&status)
                .with_context(|| format!("unknown teacher attendance status {status:?}"))?;
            Ok(TeacherAttendance {
                teacher_id,
                teacher_name,
                status,
                check_in_time,
                check_out_time,
            })
            },
        )
        .collect()
}

/// Replaces every record stored for the day with `records`, preserving their order.
pub fn replace_teacher_day(
    conn: &Connection,
    date: &str,
    records: &[TeacherAttendance],
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM teacher_attendance WHERE date = ?", [date])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO teacher_attendance(date, teacher_id, teacher_name, position, status, check_in_time, check_out_time)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (i, rec) in records.iter().enumerate() {
            stmt.execute(rusqlite::params![
                date,
                rec.teacher_id,
                rec.teacher_name,
                i as i64,
                rec.status.as_str(),
                rec.check_in_time,
                rec.check_out_time
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn student_statuses(conn: &Connection, date: &str) -> anyhow::Result<HashMap<String, StudentStatus>> {
    let mut stmt = conn.prepare("SELECT student_id, status FROM student_attendance WHERE date = ?")?;
    let rows = stmt
        .query_map([date], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, status)| -> anyhow::Result<(String, StudentStatus)> {
            let parsed = StudentStatus::parse(&status)
                .with_context(|| format!("unknown student attendance status {status:?}"))?;
            Ok((id, parsed))
        })
        .collect()
}

/// Sets the status for each student on the date in one transaction, inserting rows as needed.
pub fn upsert_student_statuses(
    conn: &Connection,
    date: &str,
    student_ids: &[String],
    status: StudentStatus,
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO student_attendance(id, student_id, date, status) VALUES(?, ?, ?, ?)
             ON CONFLICT(student_id, date) DO UPDATE SET status = excluded.status",
        )?;
        for sid in student_ids {
            stmt.execute((Uuid::new_v4().to_string(), sid, date, status.as_str()))?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn is_empty(conn: &Connection) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM students) + (SELECT COUNT(*) FROM teachers)",
        [],
        |r| r.get(0),
    )?;
    Ok(count == 0)
}

/// Sample roster written into a brand-new workspace on request.
pub fn seed_defaults(conn: &Connection) -> anyhow::Result<()> {
    let students = [
        ("S001", "Alice Johnson", 5, "5A", "2022-09-01", "John Johnson", "2014-05-20", "123 Maple St, Springfield", "555-0101"),
        ("S002", "Bob Williams", 3, "3B", "2023-01-15", "Sarah Williams", "2016-08-12", "456 Oak Ave, Shelbyville", "555-0102"),
        ("S003", "Charlie Brown", 8, "8A", "2021-09-01", "James Brown", "2011-02-28", "789 Pine Ln, Capital City", "555-0103"),
        ("S004", "Diana Miller", 2, "2C", "2023-09-01", "Patricia Miller", "2017-11-05", "101 Elm Ct, Ogdenville", "555-0104"),
        ("S005", "Ethan Davis", 7, "7B", "2022-01-20", "Robert Davis", "2012-07-19", "212 Birch Rd, North Haverbrook", "555-0105"),
        ("S006", "Fiona Garcia", 1, "1A", "2024-02-10", "Maria Garcia", "2018-04-30", "333 Cedar Blvd, Brockway", "555-0106"),
    ];
    let teachers = [
        ("T01", "Mr. David Smith", "Mathematics", "2018-08-15", "d.smith@raphtech.edu", "555-0101", "M.Ed. in Mathematics, B.S. in Applied Mathematics"),
        ("T02", "Ms. Emily Jones", "Science", "2020-07-22", "e.jones@raphtech.edu", "555-0102", "Ph.D. in Biology, B.S. in Chemistry"),
        ("T03", "Mrs. Olivia Wilson", "English", "2015-09-01", "o.wilson@raphtech.edu", "555-0103", "M.A. in English Literature"),
        ("T04", "Mr. Michael Taylor", "History", "2021-01-10", "m.taylor@raphtech.edu", "555-0104", "B.A. in History, Teaching Certification"),
    ];

    let tx = conn.unchecked_transaction()?;
    for (id, name, grade, class_name, enrolled, guardian, dob, address, phone) in students {
        insert_student(
            &tx,
            &Student {
                id: id.to_string(),
                name: name.to_string(),
                grade,
                class_name: class_name.to_string(),
                enrollment_date: enrolled.to_string(),
                guardian: guardian.to_string(),
                date_of_birth: dob.to_string(),
                address: address.to_string(),
                guardian_phone: phone.to_string(),
                image_url: None,
            },
        )?;
    }
    for (id, name, subject, hired, email, phone, qualifications) in teachers {
        insert_teacher(
            &tx,
            &Teacher {
                id: id.to_string(),
                name: name.to_string(),
                subject: subject.to_string(),
                hire_date: hired.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                qualifications: qualifications.to_string(),
                image_url: None,
            },
        )?;
    }
    records::seed_defaults(&tx)?;
    tx.commit()?;
    Ok(())
}
