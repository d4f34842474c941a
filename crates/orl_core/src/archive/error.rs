use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Corrupted archive")]
    Corrupted,

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Archive not found: {path}")]
    FileNotFound { path: String },
}

impl ArchiveError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            ArchiveError::Io(_) => true,
            ArchiveError::FileNotFound { .. } => true,
            ArchiveError::Corrupted => false,
            ArchiveError::ChecksumMismatch => false,
            // No migration path; a newer writer means a newer reader is needed.
            ArchiveError::VersionMismatch { .. } => false,
            _ => false,
        }
    }
}
