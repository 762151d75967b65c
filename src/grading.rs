use serde::Serialize;

use crate::roster::Lecture;

/// Minimum percentage of the class maximum for each grade, best first.
const GRADE_BANDS: [(u32, u8); 4] = [(87, 1), (75, 2), (62, 3), (51, 4)];
const LOWEST_GRADE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    pub max_points: u8,
    pub grades: Vec<u8>,
    pub average_grade: f64,
}

pub fn grade_for_percentage(percentage: u32) -> u8 {
    GRADE_BANDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(LOWEST_GRADE)
}

/// Truncating `points * 100 / max_points`. `max_points` must be non-zero.
pub fn percentage(points: u8, max_points: u8) -> u32 {
    u32::from(points) * 100 / u32::from(max_points)
}

/// Relative grades for a set of point totals, in input order.
/// Returns `None` for an empty class.
pub fn curve<I>(points: I) -> Option<Curve>
where
    I: IntoIterator<Item = u8>,
{
    let points: Vec<u8> = points.into_iter().collect();
    if points.is_empty() {
        return None;
    }

    let max_points = points.iter().copied().max().unwrap_or(0);
    if max_points == 0 {
        // Nobody scored: everyone tops the curve.
        return Some(Curve {
            max_points,
            grades: vec![1; points.len()],
            average_grade: 1.0,
        });
    }

    let grades: Vec<u8> = points
        .iter()
        .map(|p| grade_for_percentage(percentage(*p, max_points)))
        .collect();
    let total: u32 = grades.iter().map(|g| u32::from(*g)).sum();
    let average_grade = f64::from(total) / grades.len() as f64;

    Some(Curve {
        max_points,
        grades,
        average_grade,
    })
}

/// Grade the lecture in place. An empty roster is left untouched.
pub fn calc(lecture: &mut Lecture) -> Option<Curve> {
    let curve = curve(lecture.students().iter().map(|s| s.points))?;
    lecture.apply_grades(&curve.grades, curve.average_grade);
    Some(curve)
}
