//! Per-cycle streaming revenue ledger
//!
//! In-memory store with the uniqueness guarantee the rest of the pipeline
//! relies on: at most one row per (key, cycle). Every battle's payout for a
//! key within a cycle lands in that one row through
//! [`RevenueLedger::record_or_accumulate`], the single mutation entry point.
//!
//! The store itself is single-writer (`&mut self`); callers that settle
//! battles in parallel serialize access around it. Snapshots can be written
//! to and read from disk as JSON for offline inspection.

pub mod error;

pub use error::LedgerError;

use crate::models::{LedgerEntry, LedgerKey};
use fxhash::FxHashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct RevenueLedger {
    entries: FxHashMap<(LedgerKey, u32), LedgerEntry>,
}

impl RevenueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a battle's payout into the (key, cycle) row.
    ///
    /// Creates the row on first sight of the pair, otherwise adds to both the
    /// revenue and battle counters of the existing row. Returns the row as it
    /// stands after the write. Negative amounts and counter overflow are
    /// rejected before any mutation.
    pub fn record_or_accumulate(
        &mut self,
        key: LedgerKey,
        cycle_number: u32,
        revenue: i64,
        battle_increment: u32,
    ) -> Result<LedgerEntry, LedgerError> {
        if revenue < 0 {
            return Err(LedgerError::NegativeRevenue {
                key: key.to_string(),
                amount: revenue,
            });
        }

        match self.entries.get_mut(&(key, cycle_number)) {
            Some(row) => {
                row.streaming_revenue.checked_add(revenue).ok_or_else(|| {
                    LedgerError::RevenueOverflow {
                        key: key.to_string(),
                        cycle: cycle_number,
                    }
                })?;
                row.battles_in_cycle
                    .checked_add(battle_increment)
                    .ok_or_else(|| LedgerError::RevenueOverflow {
                        key: key.to_string(),
                        cycle: cycle_number,
                    })?;
                row.accumulate(revenue, battle_increment);
                log::debug!(
                    "Ledger accumulate {} cycle {}: +{} ({} total)",
                    key,
                    cycle_number,
                    revenue,
                    row.streaming_revenue
                );
                Ok(row.clone())
            }
            None => {
                let row = LedgerEntry::open(key, cycle_number, revenue, battle_increment);
                self.entries.insert((key, cycle_number), row.clone());
                log::debug!("Ledger open {} cycle {}: {}", key, cycle_number, revenue);
                Ok(row)
            }
        }
    }

    pub fn entry(&self, key: LedgerKey, cycle_number: u32) -> Option<&LedgerEntry> {
        self.entries.get(&(key, cycle_number))
    }

    /// Accumulated revenue for a key in a cycle, zero when no row exists.
    pub fn revenue_for(&self, key: LedgerKey, cycle_number: u32) -> i64 {
        self.entry(key, cycle_number)
            .map(|row| row.streaming_revenue)
            .unwrap_or(0)
    }

    /// All rows for one cycle, ordered by key.
    pub fn cycle_rows(&self, cycle_number: u32) -> Vec<&LedgerEntry> {
        let mut rows: Vec<&LedgerEntry> = self
            .entries
            .values()
            .filter(|row| row.cycle_number == cycle_number)
            .collect();
        rows.sort_by_key(|row| row.key);
        rows
    }

    /// Total streaming revenue paid out in one cycle.
    pub fn cycle_total(&self, cycle_number: u32) -> i64 {
        self.cycle_rows(cycle_number)
            .iter()
            .map(|row| row.streaming_revenue)
            .sum()
    }

    pub fn row_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every row to a JSON snapshot file.
    pub fn save_to_path(&self, path: &Path) -> Result<(), LedgerError> {
        let mut rows: Vec<&LedgerEntry> = self.entries.values().collect();
        rows.sort_by_key(|row| (row.cycle_number, row.key));
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &rows)?;
        log::info!("Ledger snapshot saved: {} rows to {:?}", rows.len(), path);
        Ok(())
    }

    /// Load a snapshot, rejecting files that violate (key, cycle) uniqueness.
    pub fn load_from_path(path: &Path) -> Result<Self, LedgerError> {
        let file = std::fs::File::open(path)?;
        let rows: Vec<LedgerEntry> = serde_json::from_reader(file)?;
        let mut ledger = Self::new();
        for row in rows {
            let slot = (row.key, row.cycle_number);
            if ledger.entries.contains_key(&slot) {
                return Err(LedgerError::DuplicateRow {
                    key: row.key.to_string(),
                    cycle: row.cycle_number,
                });
            }
            ledger.entries.insert(slot, row);
        }
        log::info!("Ledger snapshot loaded: {} rows from {:?}", ledger.entries.len(), path);
        Ok(ledger)
    }
}
