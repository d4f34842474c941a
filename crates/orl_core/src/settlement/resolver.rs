//! Verdict resolution
//!
//! Pure translation from a validated battle report to an immutable outcome.
//! No counters move here; the resolver only decides who won.
//!
//! The one rule that matters for tag teams: a side is defeated iff its
//! CURRENT fighter is down. A robot that tagged out at 0 HP loses its team
//! nothing while the reserve is still standing.

use crate::error::Result;
use crate::models::{BattleOutcome, BattleReport, SideId, SideSummary, Verdict};

pub struct OutcomeResolver;

impl OutcomeResolver {
    /// Resolve a report into an outcome.
    ///
    /// Validation runs first; a malformed report returns an error before any
    /// verdict logic. After validation no HP combination can fail: a fight
    /// that somehow ends with both fighters standing and no time-out settles
    /// as a draw and is flagged `anomalous`.
    pub fn resolve(report: &BattleReport) -> Result<BattleOutcome> {
        report.validate()?;

        let side_b = match &report.side_b {
            Some(side) => side,
            None => {
                // Bye: the phantom opponent never defeats the real side.
                return Ok(BattleOutcome {
                    battle_id: report.battle_id,
                    cycle_number: report.cycle_number,
                    kind: report.kind,
                    verdict: Verdict::Win(SideId::A),
                    is_bye: true,
                    anomalous: false,
                    side_a: SideSummary::from_report(&report.side_a),
                    side_b: None,
                });
            }
        };

        let a_down = report.side_a.current_fighter().is_down();
        let b_down = side_b.current_fighter().is_down();

        let (verdict, anomalous) = match (a_down, b_down) {
            (true, true) => (Verdict::Draw, false),
            (true, false) => (Verdict::Win(SideId::B), false),
            (false, true) => (Verdict::Win(SideId::A), false),
            (false, false) if report.timed_out => (Verdict::Draw, false),
            (false, false) => anomalous_draw(report),
        };

        Ok(BattleOutcome {
            battle_id: report.battle_id,
            cycle_number: report.cycle_number,
            kind: report.kind,
            verdict,
            is_bye: false,
            anomalous,
            side_a: SideSummary::from_report(&report.side_a),
            side_b: Some(SideSummary::from_report(side_b)),
        })
    }
}

/// Both fighters standing without a time-out. The report contract says this
/// cannot happen after a finished fight, so it settles as a draw with the
/// anomaly flag set for reporting.
fn anomalous_draw(report: &BattleReport) -> (Verdict, bool) {
    #[cfg(feature = "strict_contracts")]
    panic!(
        "battle {} ended with both fighters standing and no time-out",
        report.battle_id
    );

    #[cfg(not(feature = "strict_contracts"))]
    {
        log::warn!(
            "battle {}: both fighters standing with no time-out, settling as draw",
            report.battle_id
        );
        (Verdict::Draw, true)
    }
}
