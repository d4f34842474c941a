use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Negative revenue {amount} for {key}")]
    NegativeRevenue { key: String, amount: i64 },

    #[error("Revenue overflow for {key} in cycle {cycle}")]
    RevenueOverflow { key: String, cycle: u32 },

    #[error("Duplicate row for {key} in cycle {cycle}")]
    DuplicateRow { key: String, cycle: u32 },
}

impl LedgerError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            LedgerError::Io(_) => true,
            LedgerError::NegativeRevenue { .. } => false,
            LedgerError::RevenueOverflow { .. } => false,
            LedgerError::DuplicateRow { .. } => false,
            LedgerError::Serialization(_) => false,
        }
    }
}
