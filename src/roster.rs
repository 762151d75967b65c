use serde::Serialize;

use crate::error::RosterError;
use crate::validate::{validate_lecture_name, validate_student_name, PointDelta};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub name: String,
    pub points: u8,
    /// 0 = ungraded, otherwise 1 (best) to 5.
    pub grade: u8,
}

/// Whether the grades stored on the roster can be trusted.
///
/// `Stale` only arises from loading a record file that carries grades: the
/// grades are present but no average was computed for them in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GradeStatus {
    Never,
    Stale,
    Current,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lecture {
    name: String,
    students: Vec<Student>,
    average_grade: f64,
    status: GradeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub name: String,
    pub points: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
}

/// Snapshot used by `print`. The shape follows the lecture's grade status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureView {
    pub name: String,
    pub student_count: usize,
    pub shape: GradeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_grade: Option<f64>,
    pub students: Vec<StudentRow>,
}

impl Lecture {
    pub fn create(name: &str) -> Result<Self, RosterError> {
        validate_lecture_name(name)?;
        Ok(Self {
            name: name.to_string(),
            students: Vec::new(),
            average_grade: 0.0,
            status: GradeStatus::Never,
        })
    }

    /// Build a lecture from already-validated rows. Name uniqueness is the
    /// caller's responsibility.
    pub(crate) fn from_records(name: &str, students: Vec<Student>) -> Result<Self, RosterError> {
        validate_lecture_name(name)?;
        let status = if students.iter().any(|s| s.grade != 0) {
            GradeStatus::Stale
        } else {
            GradeStatus::Never
        };
        Ok(Self {
            name: name.to_string(),
            students,
            average_grade: 0.0,
            status,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn average_grade(&self) -> f64 {
        self.average_grade
    }

    pub fn status(&self) -> GradeStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Result<usize, RosterError> {
        self.students
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| RosterError::NotFound(name.to_string()))
    }

    pub fn enrol(&mut self, name: &str) -> Result<(), RosterError> {
        validate_student_name(name)?;
        if self.find_by_name(name).is_ok() {
            return Err(RosterError::DuplicateName(name.to_string()));
        }

        let mut owned = String::new();
        owned
            .try_reserve_exact(name.len())
            .map_err(|_| RosterError::AllocationFailure)?;
        owned.push_str(name);
        self.students
            .try_reserve(1)
            .map_err(|_| RosterError::AllocationFailure)?;

        self.invalidate_grades();
        self.students.push(Student {
            name: owned,
            points: 0,
            grade: 0,
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Student, RosterError> {
        let idx = self.find_by_name(name)?;
        self.invalidate_grades();
        Ok(self.students.remove(idx))
    }

    /// Apply a signed point change to one student. Returns the new total.
    pub fn give_or_deduct(&mut self, name: &str, delta: PointDelta) -> Result<u8, RosterError> {
        let idx = self.find_by_name(name)?;
        let current = self.students[idx].points;
        let Some(next) = delta.apply(current) else {
            return Err(RosterError::LimitExceeded {
                name: name.to_string(),
                points: current,
                delta: delta.to_string(),
            });
        };
        self.invalidate_grades();
        self.students[idx].points = next;
        Ok(next)
    }

    /// Store a freshly computed curve. `grades` is parallel to the roster.
    pub(crate) fn apply_grades(&mut self, grades: &[u8], average_grade: f64) {
        debug_assert_eq!(grades.len(), self.students.len());
        for (student, grade) in self.students.iter_mut().zip(grades) {
            student.grade = *grade;
        }
        self.average_grade = average_grade;
        self.status = GradeStatus::Current;
    }

    fn invalidate_grades(&mut self) {
        for s in self.students.iter_mut() {
            s.grade = 0;
        }
        self.average_grade = 0.0;
        self.status = GradeStatus::Never;
    }

    pub fn view(&self) -> LectureView {
        let with_grades = self.status != GradeStatus::Never;
        LectureView {
            name: self.name.clone(),
            student_count: self.students.len(),
            shape: self.status,
            average_grade: (self.status == GradeStatus::Current).then_some(self.average_grade),
            students: self
                .students
                .iter()
                .map(|s| StudentRow {
                    name: s.name.clone(),
                    points: s.points,
                    grade: with_grades.then_some(s.grade),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture_with(names: &[&str]) -> Lecture {
        let mut lecture = Lecture::create("Physics").expect("create");
        for n in names {
            lecture.enrol(n).expect("enrol");
        }
        lecture
    }

    fn graded(points: &[(&str, u8, u8)]) -> Lecture {
        let students = points
            .iter()
            .map(|(name, points, grade)| Student {
                name: name.to_string(),
                points: *points,
                grade: *grade,
            })
            .collect();
        let mut lecture = Lecture::from_records("Physics", students).expect("lecture");
        let grades: Vec<u8> = points.iter().map(|(_, _, g)| *g).collect();
        lecture.apply_grades(&grades, 2.5);
        lecture
    }

    #[test]
    fn create_validates_name() {
        assert!(Lecture::create("Math101").is_ok());
        assert_eq!(
            Lecture::create("Math 101"),
            Err(RosterError::InvalidName("Math 101".to_string()))
        );
        let lecture = Lecture::create("Math").expect("create");
        assert!(lecture.is_empty());
        assert_eq!(lecture.average_grade(), 0.0);
        assert_eq!(lecture.status(), GradeStatus::Never);
    }

    #[test]
    fn enrol_appends_in_order_with_zero_points() {
        let lecture = lecture_with(&["Ann", "Bob", "Cid"]);
        let names: Vec<&str> = lecture.students().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob", "Cid"]);
        assert!(lecture.students().iter().all(|s| s.points == 0 && s.grade == 0));
    }

    #[test]
    fn enrol_rejects_duplicates_case_sensitively() {
        let mut lecture = lecture_with(&["Ann"]);
        assert_eq!(
            lecture.enrol("Ann"),
            Err(RosterError::DuplicateName("Ann".to_string()))
        );
        assert!(lecture.enrol("ann").is_ok());
        assert_eq!(lecture.len(), 2);
    }

    #[test]
    fn enrol_rejects_bad_names_without_change() {
        let mut lecture = lecture_with(&["Ann"]);
        assert!(matches!(lecture.enrol("B0b"), Err(RosterError::InvalidName(_))));
        assert_eq!(lecture.len(), 1);
    }

    #[test]
    fn remove_closes_gap_and_keeps_order() {
        let mut lecture = lecture_with(&["Ann", "Bob", "Cid", "Dee"]);
        let removed = lecture.remove("Bob").expect("remove");
        assert_eq!(removed.name, "Bob");
        let names: Vec<&str> = lecture.students().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Cid", "Dee"]);
        assert_eq!(lecture.find_by_name("Dee"), Ok(2));
    }

    #[test]
    fn remove_missing_student_is_not_found() {
        let mut lecture = lecture_with(&["Ann"]);
        assert_eq!(
            lecture.remove("Bob"),
            Err(RosterError::NotFound("Bob".to_string()))
        );
        assert_eq!(lecture.len(), 1);
    }

    #[test]
    fn reenrol_starts_from_zero_points() {
        let mut lecture = lecture_with(&["Ann", "Bob"]);
        lecture
            .give_or_deduct("Bob", PointDelta::add(40))
            .expect("give");
        lecture.remove("Bob").expect("remove");
        assert_eq!(lecture.len(), 1);
        lecture.enrol("Bob").expect("enrol again");
        assert_eq!(lecture.students()[1].points, 0);
    }

    #[test]
    fn give_rejects_overflow_and_keeps_points() {
        let mut lecture = lecture_with(&["Ann"]);
        assert_eq!(lecture.give_or_deduct("Ann", PointDelta::add(95)), Ok(95));
        let err = lecture
            .give_or_deduct("Ann", PointDelta::add(6))
            .expect_err("overflow");
        assert_eq!(err.code(), "limit_exceeded");
        assert_eq!(lecture.students()[0].points, 95);

        assert!(lecture
            .give_or_deduct("Ann", PointDelta::deduct(96))
            .is_err());
        assert_eq!(lecture.give_or_deduct("Ann", PointDelta::deduct(95)), Ok(0));
    }

    #[test]
    fn give_to_unknown_student_is_not_found() {
        let mut lecture = lecture_with(&["Ann"]);
        assert_eq!(
            lecture.give_or_deduct("Zed", PointDelta::add(1)),
            Err(RosterError::NotFound("Zed".to_string()))
        );
    }

    #[test]
    fn every_mutation_resets_grades_and_average() {
        let mut lecture = graded(&[("Ann", 90, 1), ("Bob", 60, 3)]);
        lecture.enrol("Cid").expect("enrol");
        assert_eq!(lecture.status(), GradeStatus::Never);
        assert_eq!(lecture.average_grade(), 0.0);
        assert!(lecture.students().iter().all(|s| s.grade == 0));

        let mut lecture = graded(&[("Ann", 90, 1), ("Bob", 60, 3)]);
        lecture.remove("Ann").expect("remove");
        assert_eq!(lecture.students()[0].grade, 0);
        assert_eq!(lecture.status(), GradeStatus::Never);

        let mut lecture = graded(&[("Ann", 90, 1), ("Bob", 60, 3)]);
        lecture
            .give_or_deduct("Bob", PointDelta::deduct(10))
            .expect("deduct");
        assert!(lecture.students().iter().all(|s| s.grade == 0));
        assert_eq!(lecture.average_grade(), 0.0);
    }

    #[test]
    fn failed_mutation_keeps_grades() {
        let mut lecture = graded(&[("Ann", 90, 1)]);
        assert!(lecture.give_or_deduct("Ann", PointDelta::add(20)).is_err());
        assert!(lecture.enrol("Ann").is_err());
        assert!(lecture.remove("Bob").is_err());
        assert_eq!(lecture.status(), GradeStatus::Current);
        assert_eq!(lecture.students()[0].grade, 1);
    }

    #[test]
    fn loaded_grades_are_stale() {
        let students = vec![
            Student {
                name: "Ann".to_string(),
                points: 50,
                grade: 2,
            },
            Student {
                name: "Bob".to_string(),
                points: 10,
                grade: 0,
            },
        ];
        let lecture = Lecture::from_records("Bio", students).expect("lecture");
        assert_eq!(lecture.status(), GradeStatus::Stale);
        let view = lecture.view();
        assert_eq!(view.shape, GradeStatus::Stale);
        assert_eq!(view.average_grade, None);
        assert_eq!(view.students[0].grade, Some(2));
    }

    #[test]
    fn view_hides_grades_until_graded() {
        let lecture = lecture_with(&["Ann"]);
        let view = lecture.view();
        assert_eq!(view.student_count, 1);
        assert_eq!(view.shape, GradeStatus::Never);
        assert_eq!(view.students[0].grade, None);

        let view = graded(&[("Ann", 90, 1)]).view();
        assert_eq!(view.average_grade, Some(2.5));
        assert_eq!(view.students[0].grade, Some(1));
    }
}
