//! Cycle archive container
//!
//! Offline storage for one settled cycle: the full audit event trail, the
//! final summary, and the ledger rows, packed as MessagePack + LZ4 with a
//! SHA-256 trailer and an atomic temp-then-rename file write.

pub mod error;

pub use error::ArchiveError;

use crate::models::{AuditEvent, CycleSummary, LedgerEntry};
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use std::fs::{rename, File};
use std::io::{Read, Write};
use std::path::Path;
use time::OffsetDateTime;

pub const ARCHIVE_VERSION: u32 = 1;

/// Everything needed to replay or audit one settled cycle offline.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CycleArchive {
    /// Archive format version for the reader gate.
    pub version: u32,

    /// Written-at timestamp (unix milliseconds).
    pub timestamp: u64,

    pub cycle_number: u32,

    /// Final cycle summary, as the pipeline reported it.
    pub summary: CycleSummary,

    /// Full audit trail in sequence order.
    pub events: Vec<AuditEvent>,

    /// Ledger rows for the cycle at close.
    pub ledger_rows: Vec<LedgerEntry>,
}

impl CycleArchive {
    pub fn new(
        cycle_number: u32,
        summary: CycleSummary,
        events: Vec<AuditEvent>,
        ledger_rows: Vec<LedgerEntry>,
    ) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            timestamp: current_timestamp(),
            cycle_number,
            summary,
            events,
            ledger_rows,
        }
    }

    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.summary.cycle_number != self.cycle_number {
            return Err(ArchiveError::Corrupted);
        }

        // Events must all belong to this cycle, in strictly increasing
        // sequence order.
        let mut last_sequence = 0;
        for event in &self.events {
            if event.cycle_number != self.cycle_number {
                return Err(ArchiveError::Corrupted);
            }
            if event.sequence_number <= last_sequence {
                return Err(ArchiveError::Corrupted);
            }
            last_sequence = event.sequence_number;
        }

        for row in &self.ledger_rows {
            if row.cycle_number != self.cycle_number {
                return Err(ArchiveError::Corrupted);
            }
        }

        Ok(())
    }
}

/// Serialize and compress a cycle archive
pub fn serialize_and_compress(archive: &CycleArchive) -> Result<Vec<u8>, ArchiveError> {
    archive.validate()?;

    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(archive)?;

    // 2. Compress with LZ4 (size prepended for easy decompression)
    let compressed = compress_prepend_size(&msgpack);

    // 3. Add SHA256 checksum at the end
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Decompress and deserialize a cycle archive
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<CycleArchive, ArchiveError> {
    // Check minimum size (header + checksum)
    if bytes.len() < 4 + 32 {
        return Err(ArchiveError::Corrupted);
    }

    // Split payload and checksum
    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    // Verify checksum
    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(ArchiveError::ChecksumMismatch);
    }

    // Decompress
    let msgpack = decompress_size_prepended(payload).map_err(|_| ArchiveError::Decompression)?;

    // Deserialize
    let archive: CycleArchive = from_slice(&msgpack)?;

    // Reject archives written by a newer format
    if archive.version > ARCHIVE_VERSION {
        return Err(ArchiveError::VersionMismatch {
            found: archive.version,
            expected: ARCHIVE_VERSION,
        });
    }

    archive.validate()?;

    Ok(archive)
}

/// Write an archive atomically: temp file, flush, fsync, rename.
pub fn write_archive(path: &Path, archive: &CycleArchive) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serialize_and_compress(archive)?;

    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.flush()?;
        file.sync_all()?;
    }
    rename(&temp_path, path)?;

    log::debug!("Archived cycle {} ({} bytes) to {:?}", archive.cycle_number, data.len(), path);
    Ok(())
}

pub fn read_archive(path: &Path) -> Result<CycleArchive, ArchiveError> {
    if !path.exists() {
        return Err(ArchiveError::FileNotFound { path: path.display().to_string() });
    }

    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    let archive = decompress_and_deserialize(&data)?;
    log::debug!("Loaded cycle {} archive from {:?}", archive.cycle_number, path);
    Ok(archive)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LedgerEntry, LedgerKey};
    use tempfile::TempDir;

    fn sample_archive() -> CycleArchive {
        let summary = CycleSummary {
            cycle_number: 3,
            scheduled: 1,
            settled: 1,
            decisive: 1,
            total_revenue_paid: 2001,
            ..CycleSummary::default()
        };
        let events = vec![
            AuditEvent::cycle_start(3, 1, 1),
            AuditEvent::cycle_complete(3, 2, summary.clone()),
        ];
        let rows = vec![LedgerEntry::open(LedgerKey::Robot(7), 3, 2001, 1)];
        CycleArchive::new(3, summary, events, rows)
    }

    #[test]
    fn test_archive_roundtrip() {
        let archive = sample_archive();

        let bytes = serialize_and_compress(&archive).unwrap();
        let restored = decompress_and_deserialize(&bytes).unwrap();

        assert_eq!(restored.version, archive.version);
        assert_eq!(restored.cycle_number, 3);
        assert_eq!(restored.events.len(), 2);
        assert_eq!(restored.summary.total_revenue_paid, 2001);
        assert_eq!(restored.ledger_rows[0].streaming_revenue, 2001);
    }

    #[test]
    fn test_checksum_validation() {
        let archive = sample_archive();
        let mut bytes = serialize_and_compress(&archive).unwrap();

        // Corrupt the checksum
        if let Some(last) = bytes.last_mut() {
            *last = last.wrapping_add(1);
        }

        let result = decompress_and_deserialize(&bytes);
        assert!(matches!(result, Err(ArchiveError::ChecksumMismatch)));
    }

    #[test]
    fn test_truncated_archive_rejected() {
        let result = decompress_and_deserialize(&[0u8; 10]);
        assert!(matches!(result, Err(ArchiveError::Corrupted)));
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut archive = sample_archive();
        archive.version = ARCHIVE_VERSION + 1;

        let bytes = serialize_and_compress(&archive).unwrap();
        let result = decompress_and_deserialize(&bytes);
        assert!(matches!(
            result,
            Err(ArchiveError::VersionMismatch { found, expected: ARCHIVE_VERSION })
                if found == ARCHIVE_VERSION + 1
        ));
    }

    #[test]
    fn test_foreign_cycle_event_rejected() {
        let mut archive = sample_archive();
        archive.events.push(AuditEvent::cycle_start(9, 3, 1));

        let result = serialize_and_compress(&archive);
        assert!(matches!(result, Err(ArchiveError::Corrupted)));
    }

    #[test]
    fn test_sequence_regression_rejected() {
        let mut archive = sample_archive();
        archive.events.push(AuditEvent::cycle_start(3, 2, 1));

        let result = serialize_and_compress(&archive);
        assert!(matches!(result, Err(ArchiveError::Corrupted)));
    }

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cycle_3.orla");

        let archive = sample_archive();
        write_archive(&path, &archive).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let restored = read_archive(&path).unwrap();
        assert_eq!(restored.cycle_number, 3);
        assert_eq!(restored.events.len(), 2);
    }

    #[test]
    fn test_missing_archive_is_recoverable() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_archive(&temp_dir.path().join("absent.orla")).unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound { .. }));
        assert!(err.is_recoverable());
        assert!(!ArchiveError::ChecksumMismatch.is_recoverable());
    }
}
