use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::RosterError;
use crate::roster::{Lecture, Student};
use crate::validate::{
    parse_grade, parse_point_digits, validate_lecture_name, validate_student_name,
};

pub const RECORD_EXTENSION: &str = "csv";

/// Lecture name for a record file: the base name without its extension.
pub fn lecture_name_from_path(path: &Path) -> Result<String, RosterError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    validate_lecture_name(&stem)?;
    Ok(stem)
}

pub fn load_lecture(path: &Path) -> Result<Lecture, RosterError> {
    let bytes = std::fs::read(path).map_err(|e| RosterError::unavailable(path, &e))?;
    let source = path.to_string_lossy();
    let text = match String::from_utf8(bytes) {
        Ok(v) => v,
        Err(e) => {
            let bad_at = e.utf8_error().valid_up_to();
            let line = e.as_bytes()[..bad_at].iter().filter(|b| **b == b'\n').count() + 1;
            return Err(RosterError::malformed(&source, line, "not ASCII text"));
        }
    };

    let name = lecture_name_from_path(path)?;
    let students = parse_records(&text, &source)?;
    log::debug!(
        "loaded {} student(s) for lecture {} from {}",
        students.len(),
        name,
        source
    );
    Lecture::from_records(&name, students)
}

/// Parse a whole record file. Every row must be `name,points,grade\n`.
pub fn parse_records(text: &str, source: &str) -> Result<Vec<Student>, RosterError> {
    let mut students: Vec<Student> = Vec::new();
    students
        .try_reserve(text.matches('\n').count())
        .map_err(|_| RosterError::AllocationFailure)?;

    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let Some(row) = raw.strip_suffix('\n') else {
            return Err(RosterError::malformed(
                source,
                line_no,
                "row is not terminated by a newline",
            ));
        };
        students.push(parse_row(row, source, line_no)?);
    }

    // Names are checked across the whole file once every row parsed.
    let mut seen: HashSet<&str> = HashSet::new();
    for (idx, s) in students.iter().enumerate() {
        if !seen.insert(s.name.as_str()) {
            return Err(RosterError::malformed(
                source,
                idx + 1,
                format!("duplicate student name {}", s.name),
            ));
        }
    }

    Ok(students)
}

fn parse_row(row: &str, source: &str, line_no: usize) -> Result<Student, RosterError> {
    let mut fields = row.splitn(3, ',');
    let name = fields.next().unwrap_or_default();
    let (Some(points), Some(grade)) = (fields.next(), fields.next()) else {
        return Err(RosterError::malformed(
            source,
            line_no,
            "expected name,points,grade",
        ));
    };

    if validate_student_name(name).is_err() {
        return Err(RosterError::malformed(
            source,
            line_no,
            format!("invalid student name {name:?}"),
        ));
    }
    let Some(points) = parse_point_digits(points) else {
        return Err(RosterError::malformed(
            source,
            line_no,
            format!("points must be 1-3 digits from 0 to 100, got {points:?}"),
        ));
    };
    let Some(grade) = parse_grade(grade) else {
        return Err(RosterError::malformed(
            source,
            line_no,
            format!("grade must be a single digit from 0 to 5, got {grade:?}"),
        ));
    };

    Ok(Student {
        name: name.to_string(),
        points,
        grade,
    })
}

pub fn render_records(lecture: &Lecture) -> String {
    let mut out = String::new();
    for s in lecture.students() {
        let _ = writeln!(out, "{},{},{}", s.name, s.points, s.grade);
    }
    out
}

pub fn report_path(reports_dir: &Path, lecture: &Lecture) -> PathBuf {
    reports_dir.join(format!("{}.{}", lecture.name(), RECORD_EXTENSION))
}

pub fn export_lecture(lecture: &Lecture, reports_dir: &Path) -> Result<PathBuf, RosterError> {
    std::fs::create_dir_all(reports_dir).map_err(|e| RosterError::unavailable(reports_dir, &e))?;
    let out_path = report_path(reports_dir, lecture);
    std::fs::write(&out_path, render_records(lecture))
        .map_err(|e| RosterError::unavailable(&out_path, &e))?;
    log::debug!(
        "exported {} student(s) to {}",
        lecture.len(),
        out_path.to_string_lossy()
    );
    Ok(out_path)
}
