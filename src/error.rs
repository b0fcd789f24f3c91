// 错误类型
// 业务错误均可在本地恢复，由前端以提示形式展示

use thiserror::Error;

/// TrialVerse 业务错误
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("No active trial: the coordinator has not locked a schedule yet")]
    NoActiveTrial,

    #[error("Day {day} cannot be completed (current day is {current_day})")]
    InvalidTransition { day: u32, current_day: u32 },

    #[error("No condition selected")]
    NoConditionSelected,

    #[error("Not Allowed: {0} is required")]
    MissingRequiredField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Stored value under '{key}' is unreadable: {reason}")]
    CorruptState { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State lock poisoned")]
    LockPoisoned,
}

pub type TrialResult<T> = Result<T, TrialError>;
