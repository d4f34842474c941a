use std::fmt;

/// Per-battle settlement failures.
///
/// Validation variants mean the report never touched any state and must not
/// be retried as-is; persistence variants mean the settlement aborted whole
/// and is safe to retry.
#[derive(Debug)]
pub enum SettlementError {
    NonFiniteVitals { robot_id: u64 },
    DuplicateRobot { robot_id: u64 },
    SideShape { expected: &'static str, found: &'static str },
    CycleMismatch { expected: u32, found: u32 },
    UnknownRobot { robot_id: u64 },
    StudioUnavailable { stable_id: u64 },
    LedgerWrite(String),
    Persistence(String),
    AuditAppend(String),
}

#[derive(Debug)]
pub enum CoreError {
    InvalidParameter(String),
    NotFound(String),
    ProcessingError(String),
    SerializationError(String),
    DeserializationError(String),
    IoError(String),
    ParseError(String),
}

impl SettlementError {
    /// Whether retrying the same settlement whole can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SettlementError::NonFiniteVitals { .. }
            | SettlementError::DuplicateRobot { .. }
            | SettlementError::SideShape { .. }
            | SettlementError::CycleMismatch { .. } => false,
            SettlementError::UnknownRobot { .. } | SettlementError::StudioUnavailable { .. } => {
                false
            }
            SettlementError::LedgerWrite(_) | SettlementError::Persistence(_) => true,
            // Counters and ledger already committed; replaying would pay twice.
            SettlementError::AuditAppend(_) => false,
        }
    }
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettlementError::NonFiniteVitals { robot_id } => {
                write!(f, "Non-finite vitals reported for robot {}", robot_id)
            }
            SettlementError::DuplicateRobot { robot_id } => {
                write!(f, "Robot {} appears more than once in the report", robot_id)
            }
            SettlementError::SideShape { expected, found } => {
                write!(f, "Side shape mismatch: expected {}, found {}", expected, found)
            }
            SettlementError::CycleMismatch { expected, found } => {
                write!(f, "Report belongs to cycle {}, not cycle {}", found, expected)
            }
            SettlementError::UnknownRobot { robot_id } => {
                write!(f, "Robot {} is not registered", robot_id)
            }
            SettlementError::StudioUnavailable { stable_id } => {
                write!(f, "Studio level unavailable for stable {}", stable_id)
            }
            SettlementError::LedgerWrite(msg) => write!(f, "Ledger write failed: {}", msg),
            SettlementError::Persistence(msg) => write!(f, "Persistence failure: {}", msg),
            SettlementError::AuditAppend(msg) => write!(f, "Audit append failed: {}", msg),
        }
    }
}

impl std::error::Error for SettlementError {}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CoreError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            CoreError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            CoreError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            CoreError::IoError(msg) => write!(f, "IO error: {}", msg),
            CoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            CoreError::DeserializationError(err.to_string())
        } else {
            CoreError::SerializationError(err.to_string())
        }
    }
}

impl From<crate::ledger::LedgerError> for SettlementError {
    fn from(err: crate::ledger::LedgerError) -> Self {
        SettlementError::LedgerWrite(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
