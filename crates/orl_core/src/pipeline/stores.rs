//! External collaborator seams
//!
//! The pipeline reaches persistence, facility lookups, and the audit log
//! through these traits. Production deployments put real storage behind them;
//! the in-memory implementations here back tests and the batch runner.
//!
//! Contract notes:
//! - `ParticipantStore::commit` applies every record of one settled battle as
//!   a single unit, or none of them.
//! - `StudioDirectory::facilities` fails for an unknown stable. Settlement
//!   never assumes studio level 0 when the lookup comes back empty.
//! - `AuditSink::append` is append-only; the memory sink also rejects
//!   sequence numbers that do not increase within a cycle.

use crate::error::{Result, SettlementError};
use crate::models::{AuditEvent, RobotRecord};
use fxhash::FxHashMap;
use std::sync::Mutex;

/// Facility levels for one stable. The studio drives streaming revenue, the
/// repair bay discounts repair costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StableFacilities {
    pub studio_level: u32,
    pub repair_bay_level: u32,
}

impl StableFacilities {
    pub fn new(studio_level: u32, repair_bay_level: u32) -> Self {
        Self { studio_level, repair_bay_level }
    }
}

pub trait ParticipantStore {
    fn fetch(&self, robot_id: u64) -> Result<RobotRecord>;

    /// Write one battle's updated records atomically.
    fn commit(&self, records: Vec<RobotRecord>) -> Result<()>;
}

pub trait StudioDirectory {
    fn facilities(&self, stable_id: u64) -> Result<StableFacilities>;
}

pub trait AuditSink {
    fn append(&self, event: AuditEvent) -> Result<()>;
}

fn lock_poisoned(what: &str) -> SettlementError {
    SettlementError::Persistence(format!("{} lock poisoned", what))
}

// ============================================
// In-Memory Participant Store
// ============================================

#[derive(Debug, Default)]
pub struct MemoryParticipantStore {
    records: Mutex<FxHashMap<u64, RobotRecord>>,
}

impl MemoryParticipantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = RobotRecord>) -> Self {
        let map = records.into_iter().map(|record| (record.robot_id, record)).collect();
        Self { records: Mutex::new(map) }
    }

    /// Current state of one record, for inspection after settlement.
    pub fn get(&self, robot_id: u64) -> Option<RobotRecord> {
        self.records.lock().ok().and_then(|records| records.get(&robot_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParticipantStore for MemoryParticipantStore {
    fn fetch(&self, robot_id: u64) -> Result<RobotRecord> {
        let records = self.records.lock().map_err(|_| lock_poisoned("participant store"))?;
        records.get(&robot_id).cloned().ok_or(SettlementError::UnknownRobot { robot_id })
    }

    fn commit(&self, updated: Vec<RobotRecord>) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| lock_poisoned("participant store"))?;
        for record in updated {
            records.insert(record.robot_id, record);
        }
        Ok(())
    }
}

// ============================================
// In-Memory Studio Directory
// ============================================

#[derive(Debug, Default)]
pub struct MemoryStudioDirectory {
    facilities: Mutex<FxHashMap<u64, StableFacilities>>,
}

impl MemoryStudioDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, stable_id: u64, facilities: StableFacilities) -> Result<()> {
        let mut map = self.facilities.lock().map_err(|_| lock_poisoned("studio directory"))?;
        map.insert(stable_id, facilities);
        Ok(())
    }
}

impl StudioDirectory for MemoryStudioDirectory {
    fn facilities(&self, stable_id: u64) -> Result<StableFacilities> {
        let map = self.facilities.lock().map_err(|_| lock_poisoned("studio directory"))?;
        map.get(&stable_id).copied().ok_or(SettlementError::StudioUnavailable { stable_id })
    }
}

// ============================================
// In-Memory Audit Sink
// ============================================

#[derive(Debug, Default)]
struct SinkState {
    events: Vec<AuditEvent>,
    last_sequence: FxHashMap<u32, u64>,
}

/// Insertion-ordered audit log that rejects non-increasing sequence numbers
/// within a cycle.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    state: Mutex<SinkState>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Result<Vec<AuditEvent>> {
        let state = self.state.lock().map_err(|_| lock_poisoned("audit sink"))?;
        Ok(state.events.clone())
    }

    /// Events for one cycle, in the order they were appended.
    pub fn cycle_events(&self, cycle_number: u32) -> Result<Vec<AuditEvent>> {
        let state = self.state.lock().map_err(|_| lock_poisoned("audit sink"))?;
        Ok(state
            .events
            .iter()
            .filter(|event| event.cycle_number == cycle_number)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, event: AuditEvent) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned("audit sink"))?;
        let last = state.last_sequence.get(&event.cycle_number).copied().unwrap_or(0);
        if event.sequence_number <= last {
            return Err(SettlementError::AuditAppend(format!(
                "sequence {} for cycle {} is not after {}",
                event.sequence_number, event.cycle_number, last
            )));
        }
        state.last_sequence.insert(event.cycle_number, event.sequence_number);
        state.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_unknown_robot_fails() {
        let store = MemoryParticipantStore::new();
        assert!(matches!(
            store.fetch(42),
            Err(SettlementError::UnknownRobot { robot_id: 42 })
        ));
    }

    #[test]
    fn test_commit_then_fetch_round_trip() {
        let store = MemoryParticipantStore::with_records([RobotRecord::new(1, 1, "Piston")]);
        let mut record = store.fetch(1).unwrap();
        record.total_battles = 9;
        store.commit(vec![record]).unwrap();
        assert_eq!(store.fetch(1).unwrap().total_battles, 9);
    }

    #[test]
    fn test_missing_stable_is_an_error_not_level_zero() {
        let directory = MemoryStudioDirectory::new();
        directory.register(1, StableFacilities::new(3, 2)).unwrap();

        assert_eq!(directory.facilities(1).unwrap().studio_level, 3);
        assert!(matches!(
            directory.facilities(2),
            Err(SettlementError::StudioUnavailable { stable_id: 2 })
        ));
    }

    #[test]
    fn test_sink_rejects_sequence_regression() {
        let sink = MemoryAuditSink::new();
        sink.append(AuditEvent::cycle_start(1, 1, 4)).unwrap();
        sink.append(AuditEvent::cycle_start(1, 2, 4)).unwrap();

        let err = sink.append(AuditEvent::cycle_start(1, 2, 4)).unwrap_err();
        assert!(matches!(err, SettlementError::AuditAppend(_)));
        assert!(!err.is_retryable());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_sink_sequences_scoped_per_cycle() {
        let sink = MemoryAuditSink::new();
        sink.append(AuditEvent::cycle_start(1, 5, 2)).unwrap();
        // A new cycle starts its own numbering.
        sink.append(AuditEvent::cycle_start(2, 1, 2)).unwrap();
        assert_eq!(sink.cycle_events(2).unwrap().len(), 1);
    }
}
