use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

pub const MIN_CREDITS: i64 = 1;
pub const MAX_CREDITS: i64 = 5;
pub const MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    Quiz,
    Test,
    Homework,
    Project,
}

impl AssessmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::Quiz => "Quiz",
            AssessmentType::Test => "Test",
            AssessmentType::Homework => "Homework",
            AssessmentType::Project => "Project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Quiz" => Some(AssessmentType::Quiz),
            "Test" => Some(AssessmentType::Test),
            "Homework" => Some(AssessmentType::Homework),
            "Project" => Some(AssessmentType::Project),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Academic,
    Sports,
    Arts,
    Community,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Academic => "Academic",
            EventCategory::Sports => "Sports",
            EventCategory::Arts => "Arts",
            EventCategory::Community => "Community",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Academic" => Some(EventCategory::Academic),
            "Sports" => Some(EventCategory::Sports),
            "Arts" => Some(EventCategory::Arts),
            "Community" => Some(EventCategory::Community),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub code: String,
    /// Teacher display name, as the front end shows it.
    pub teacher: String,
    pub credits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub student_name: String,
    pub course_name: String,
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    pub date: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolEvent {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub description: String,
    pub category: EventCategory,
}

pub fn ensure_tables(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            teacher TEXT NOT NULL,
            credits INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS assessments(
            id TEXT PRIMARY KEY,
            student_name TEXT NOT NULL,
            course_name TEXT NOT NULL,
            kind TEXT NOT NULL,
            date TEXT NOT NULL,
            score INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events(
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Highest numeric suffix after `prefix` among `ids`, or `floor` when none is larger.
fn highest_suffix(ids: &[String], prefix: &str, floor: u64) -> u64 {
    ids.iter()
        .filter_map(|id| id.strip_prefix(prefix).and_then(|n| n.parse::<u64>().ok()))
        .fold(floor, u64::max)
}

fn all_ids(conn: &Connection, table: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {table}"))?;
    let ids = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

// --- courses ---

const COURSE_COLUMNS: &str = "id, name, code, teacher, credits";

fn course_from_row(r: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: r.get(0)?,
        name: r.get(1)?,
        code: r.get(2)?,
        teacher: r.get(3)?,
        credits: r.get(4)?,
    })
}

pub fn list_courses(conn: &Connection) -> anyhow::Result<Vec<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_course(conn: &Connection, id: &str) -> anyhow::Result<Option<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?");
    Ok(conn.query_row(&sql, [id], course_from_row).optional()?)
}

pub fn course_code_taken(conn: &Connection, code: &str) -> anyhow::Result<bool> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM courses WHERE code = ?", [code], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

/// Course ids start at `C101`.
pub fn next_course_id(conn: &Connection) -> anyhow::Result<String> {
    let ids = all_ids(conn, "courses")?;
    Ok(format!("C{}", highest_suffix(&ids, "C", 100) + 1))
}

pub fn insert_course(conn: &Connection, c: &Course) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO courses(id, name, code, teacher, credits) VALUES(?, ?, ?, ?, ?)",
        (&c.id, &c.name, &c.code, &c.teacher, c.credits),
    )?;
    Ok(())
}

pub fn update_course(conn: &Connection, c: &Course) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE courses SET name = ?, teacher = ?, credits = ? WHERE id = ?",
        (&c.name, &c.teacher, c.credits, &c.id),
    )?;
    Ok(changed > 0)
}

pub fn delete_course(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    Ok(conn.execute("DELETE FROM courses WHERE id = ?", [id])? > 0)
}

// --- assessments ---

const ASSESSMENT_COLUMNS: &str = "id, student_name, course_name, kind, date, score";

type AssessmentParts = (String, String, String, String, String, i64);

fn assessment_parts(r: &Row<'_>) -> rusqlite::Result<AssessmentParts> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn assessment_rows(conn: &Connection, sql: &str, id: Option<&str>) -> anyhow::Result<Vec<Assessment>> {
    let mut stmt = conn.prepare(sql)?;
    let raw = match id {
        Some(id) => stmt
            .query_map([id], assessment_parts)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], assessment_parts)?
            .collect::<Result<Vec<_>, _>>()?,
    };
    raw.into_iter()
        .map(
            |(id, student_name, course_name, kind, date, score)| -> anyhow::Result<Assessment> {
                let kind = AssessmentType::parse(&kind)
                    .with_context(|| format!("unknown assessment type {kind:?}"))?;
                Ok(Assessment {
                    id,
                    student_name,
                    course_name,
                    kind,
                    date,
                    score,
                })
            },
        )
        .collect()
}

pub fn list_assessments(conn: &Connection) -> anyhow::Result<Vec<Assessment>> {
    let sql = format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments ORDER BY id");
    assessment_rows(conn, &sql, None)
}

pub fn get_assessment(conn: &Connection, id: &str) -> anyhow::Result<Option<Assessment>> {
    let sql = format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = ?");
    Ok(assessment_rows(conn, &sql, Some(id))?.into_iter().next())
}

/// `A` followed by the highest numeric suffix plus one, zero-padded to three digits.
pub fn next_assessment_id(conn: &Connection) -> anyhow::Result<String> {
    let ids = all_ids(conn, "assessments")?;
    Ok(format!("A{:03}", highest_suffix(&ids, "A", 0) + 1))
}

pub fn insert_assessment(conn: &Connection, a: &Assessment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO assessments(id, student_name, course_name, kind, date, score) VALUES(?, ?, ?, ?, ?, ?)",
        (&a.id, &a.student_name, &a.course_name, a.kind.as_str(), &a.date, a.score),
    )?;
    Ok(())
}

pub fn update_assessment(conn: &Connection, a: &Assessment) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE assessments SET student_name = ?, course_name = ?, kind = ?, date = ?, score = ? WHERE id = ?",
        (&a.student_name, &a.course_name, a.kind.as_str(), &a.date, a.score, &a.id),
    )?;
    Ok(changed > 0)
}

pub fn delete_assessment(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    Ok(conn.execute("DELETE FROM assessments WHERE id = ?", [id])? > 0)
}

// --- events ---

fn event_from_parts(
    (id, title, date, description, category): (i64, String, String, String, String),
) -> anyhow::Result<SchoolEvent> {
    let category = EventCategory::parse(&category)
        .with_context(|| format!("unknown event category {category:?}"))?;
    Ok(SchoolEvent {
        id,
        title,
        date,
        description,
        category,
    })
}

fn event_parts(r: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

/// Events in calendar order.
pub fn list_events(conn: &Connection) -> anyhow::Result<Vec<SchoolEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, date, description, category FROM events ORDER BY date, id",
    )?;
    let raw = stmt
        .query_map([], event_parts)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(event_from_parts).collect()
}

pub fn get_event(conn: &Connection, id: i64) -> anyhow::Result<Option<SchoolEvent>> {
    let raw = conn
        .query_row(
            "SELECT id, title, date, description, category FROM events WHERE id = ?",
            [id],
            event_parts,
        )
        .optional()?;
    raw.map(event_from_parts).transpose()
}

pub fn next_event_id(conn: &Connection) -> anyhow::Result<i64> {
    let highest: i64 = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM events", [], |r| r.get(0))?;
    Ok(highest + 1)
}

pub fn insert_event(conn: &Connection, e: &SchoolEvent) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO events(id, title, date, description, category) VALUES(?, ?, ?, ?, ?)",
        (e.id, &e.title, &e.date, &e.description, e.category.as_str()),
    )?;
    Ok(())
}

pub fn update_event(conn: &Connection, e: &SchoolEvent) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE events SET title = ?, date = ?, description = ?, category = ? WHERE id = ?",
        (&e.title, &e.date, &e.description, e.category.as_str(), e.id),
    )?;
    Ok(changed > 0)
}

pub fn delete_event(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    Ok(conn.execute("DELETE FROM events WHERE id = ?", [id])? > 0)
}

/// Sample courses, assessments and events for a new workspace. Runs inside the caller's transaction.
pub fn seed_defaults(conn: &Connection) -> anyhow::Result<()> {
    let courses = [
        ("C101", "Algebra II", "MATH-201", "Mr. David Smith", 4),
        ("C102", "Biology", "SCI-101", "Ms. Emily Jones", 4),
        ("C103", "World Literature", "ENG-301", "Mrs. Olivia Wilson", 3),
        ("C104", "US History", "HIST-202", "Mr. Michael Taylor", 3),
        ("C105", "Introduction to Physics", "SCI-201", "Ms. Emily Jones", 4),
    ];
    for (id, name, code, teacher, credits) in courses {
        insert_course(
            conn,
            &Course {
                id: id.to_string(),
                name: name.to_string(),
                code: code.to_string(),
                teacher: teacher.to_string(),
                credits,
            },
        )?;
    }

    let assessments = [
        ("A001", "Alice Johnson", "Algebra II", AssessmentType::Test, "2024-05-10", 88),
        ("A002", "Bob Williams", "Biology", AssessmentType::Quiz, "2024-05-12", 92),
        ("A003", "Alice Johnson", "Algebra II", AssessmentType::Homework, "2024-05-15", 95),
        ("A004", "Charlie Brown", "World Literature", AssessmentType::Project, "2024-05-20", 78),
        ("A005", "Bob Williams", "Introduction to Physics", AssessmentType::Test, "2024-05-18", 85),
        ("A006", "Ethan Davis", "US History", AssessmentType::Quiz, "2024-05-14", 90),
    ];
    for (id, student_name, course_name, kind, date, score) in assessments {
        insert_assessment(
            conn,
            &Assessment {
                id: id.to_string(),
                student_name: student_name.to_string(),
                course_name: course_name.to_string(),
                kind,
                date: date.to_string(),
                score,
            },
        )?;
    }

    let events = [
        (1, "Annual Sports Day", "2024-10-15", "Get ready for a day of fun and competition! Sign-ups for events are now open.", EventCategory::Sports),
        (2, "Science Fair Submissions Due", "2024-10-25", "All students participating in the science fair must submit their project proposals.", EventCategory::Academic),
        (3, "Parent-Teacher Meetings", "2024-11-05", "Meetings will be held from 3 PM to 6 PM. Please book your slots online.", EventCategory::Community),
        (4, "School Play Auditions", "2024-11-10", "Auditions for the annual school play \"A Midsummer Night's Dream\" will be held in the auditorium.", EventCategory::Arts),
        (5, "Mid-Term Exams Begin", "2024-11-18", "Mid-term examinations for all grades will commence. Please check the schedule for details.", EventCategory::Academic),
    ];
    for (id, title, date, description, category) in events {
        insert_event(
            conn,
            &SchoolEvent {
                id,
                title: title.to_string(),
                date: date.to_string(),
                description: description.to_string(),
                category,
            },
        )?;
    }
    Ok(())
}
