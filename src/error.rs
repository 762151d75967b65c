use serde_json::json;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("name contains invalid characters: {0:?}")]
    InvalidName(String),
    #[error("invalid command usage: {0}")]
    InvalidArgument(String),
    #[error("student already exists: {0}")]
    DuplicateName(String),
    #[error("student not found: {0}")]
    NotFound(String),
    #[error("points limit exceeded: {name} has {points}, cannot apply {delta}")]
    LimitExceeded {
        name: String,
        points: u8,
        delta: String,
    },
    #[error("invalid file {path}: line {line}: {reason}")]
    MalformedRecord {
        path: String,
        line: usize,
        reason: String,
    },
    #[error("cannot access file {path}: {reason}")]
    FileUnavailable { path: String, reason: String },
    #[error("out of memory")]
    AllocationFailure,
}

impl RosterError {
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::UnknownCommand(_) => "unknown_command",
            RosterError::InvalidName(_) => "invalid_name",
            RosterError::InvalidArgument(_) => "invalid_argument",
            RosterError::DuplicateName(_) => "duplicate_name",
            RosterError::NotFound(_) => "not_found",
            RosterError::LimitExceeded { .. } => "limit_exceeded",
            RosterError::MalformedRecord { .. } => "malformed_record",
            RosterError::FileUnavailable { .. } => "file_unavailable",
            RosterError::AllocationFailure => "allocation_failure",
        }
    }

    /// Only an allocation failure ends the session; everything else re-prompts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RosterError::AllocationFailure)
    }

    pub(crate) fn malformed(path: &str, line: usize, reason: impl Into<String>) -> Self {
        RosterError::MalformedRecord {
            path: path.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(path: &std::path::Path, err: &std::io::Error) -> Self {
        RosterError::FileUnavailable {
            path: path.to_string_lossy().to_string(),
            reason: err.to_string(),
        }
    }
}

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}
