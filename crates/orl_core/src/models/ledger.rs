//! Ledger rows
//!
//! One row per (key, cycle). Solo and tournament payouts key by robot;
//! tag-team payouts key by the owning stable, which is what makes "one
//! payment per stable per tag-team battle" hold at the storage level. The
//! enum keeps the two id spaces from colliding.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger subject: who accumulates the revenue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKey {
    Robot(u64),
    Stable(u64),
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerKey::Robot(id) => write!(f, "robot:{}", id),
            LedgerKey::Stable(id) => write!(f, "stable:{}", id),
        }
    }
}

/// Cumulative revenue row for one key within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerEntry {
    pub key: LedgerKey,
    pub cycle_number: u32,
    pub streaming_revenue: i64,
    pub battles_in_cycle: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn open(key: LedgerKey, cycle_number: u32, revenue: i64, battle_increment: u32) -> Self {
        let now = Utc::now();
        Self {
            key,
            cycle_number,
            streaming_revenue: revenue,
            battles_in_cycle: battle_increment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Accumulate a further battle's revenue into this row.
    pub fn accumulate(&mut self, revenue: i64, battle_increment: u32) {
        self.streaming_revenue += revenue;
        self.battles_in_cycle += battle_increment;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_adds_to_both_fields() {
        let mut entry = LedgerEntry::open(LedgerKey::Robot(5), 2, 1200, 1);
        entry.accumulate(800, 1);
        assert_eq!(entry.streaming_revenue, 2000);
        assert_eq!(entry.battles_in_cycle, 2);
    }

    #[test]
    fn test_key_spaces_do_not_collide() {
        assert_ne!(LedgerKey::Robot(9), LedgerKey::Stable(9));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(LedgerKey::Robot(4).to_string(), "robot:4");
        assert_eq!(LedgerKey::Stable(12).to_string(), "stable:12");
    }
}
