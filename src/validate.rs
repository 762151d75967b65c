use std::fmt;

use crate::error::RosterError;

pub const MAX_POINTS: u8 = 100;
pub const MAX_GRADE: u8 = 5;
const MAX_POINT_DIGITS: usize = 3;

pub fn validate_lecture_name(name: &str) -> Result<(), RosterError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RosterError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn validate_student_name(name: &str) -> Result<(), RosterError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RosterError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Signed point change requested by `give`. The magnitude is already
/// range-checked to `0..=MAX_POINTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointDelta {
    pub magnitude: u8,
    pub deduct: bool,
}

impl PointDelta {
    pub fn add(magnitude: u8) -> Self {
        Self {
            magnitude,
            deduct: false,
        }
    }

    pub fn deduct(magnitude: u8) -> Self {
        Self {
            magnitude,
            deduct: true,
        }
    }

    /// Resulting point total, or `None` when it would leave `0..=MAX_POINTS`.
    pub fn apply(self, points: u8) -> Option<u8> {
        let next = if self.deduct {
            points.checked_sub(self.magnitude)?
        } else {
            points.checked_add(self.magnitude)?
        };
        (next <= MAX_POINTS).then_some(next)
    }
}

impl fmt::Display for PointDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deduct {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "+{}", self.magnitude)
        }
    }
}

pub fn parse_points(token: &str) -> Result<PointDelta, RosterError> {
    let (digits, deduct) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    let Some(magnitude) = parse_point_digits(digits) else {
        return Err(RosterError::InvalidArgument(format!(
            "points must be 0 to {MAX_POINTS}, optionally prefixed with '-': {token:?}"
        )));
    };
    Ok(PointDelta { magnitude, deduct })
}

/// 1 to 3 ASCII digits with a value of at most `MAX_POINTS`.
pub fn parse_point_digits(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.len() > MAX_POINT_DIGITS {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = digits.parse::<u8>().ok()?;
    (value <= MAX_POINTS).then_some(value)
}

/// Exactly one digit in `0..=MAX_GRADE`; 0 means ungraded.
pub fn parse_grade(field: &str) -> Option<u8> {
    let [b] = field.as_bytes() else {
        return None;
    };
    if !b.is_ascii_digit() {
        return None;
    }
    let grade = b - b'0';
    (grade <= MAX_GRADE).then_some(grade)
}
