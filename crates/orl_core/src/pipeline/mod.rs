//! Cycle settlement pipeline
//!
//! Drives one battle report through the fixed settlement order:
//!
//! 1. resolve the verdict ([`OutcomeResolver`])
//! 2. accrue counters for every participant ([`StatAccrual`])
//! 3. compute streaming revenue from the post-accrual counters (solo robots
//!    individually, tag teams once per team via the max-based aggregator)
//! 4. upsert the per-cycle ledger rows
//! 5. append the audit event
//!
//! Steps 2 through 4 commit as one unit. Staging happens on cloned records
//! with the ledger writes pre-checked, so by the time anything is written,
//! nothing left in the sequence can fail; an error before that point leaves
//! every store untouched and the battle safely retryable.
//!
//! Battles settle in parallel across a cycle. A per-robot lock registry keeps
//! two battles that share a robot from interleaving, without serializing the
//! rest of the batch. The audit event is appended only after the ledger holds
//! every payout of the battle, under a per-cycle monotone sequence number.

pub mod sequence;
pub mod stores;

pub use sequence::CycleSequencer;
pub use stores::{
    AuditSink, MemoryAuditSink, MemoryParticipantStore, MemoryStudioDirectory, ParticipantStore,
    StableFacilities, StudioDirectory,
};

use crate::economy::{
    EconomyConfig, RatingCalculator, RepairCalculator, RevenueCalculator, RewardCalculator,
    RobotCounters, TeamRevenueAggregator, BYE_ROBOT_RATING,
};
use crate::error::{Result, SettlementError};
use crate::ledger::RevenueLedger;
use crate::models::{
    AuditEvent, BattleAuditPayload, BattleKind, BattleOutcome, BattleReport, CycleSummary,
    FailedSettlement, FightResult, LedgerEntry, LedgerKey, ParticipantRole, RevenueRecord,
    RobotRecord, SettlementRecord, SideId, SideReport, StableAward,
};
use crate::settlement::{BattleParticipation, OutcomeResolver, StatAccrual};
use fxhash::FxHashMap;
use rayon::prelude::*;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Tournament round treated as the finals for the prestige bonus.
const FINALS_ROUND: u32 = 5;

// ============================================
// Per-Robot Lock Registry
// ============================================

/// One mutex per robot ever settled, acquired in sorted id order.
#[derive(Debug, Default)]
struct SettlementLocks {
    registry: Mutex<FxHashMap<u64, Arc<Mutex<()>>>>,
}

impl SettlementLocks {
    fn handles(&self, robot_ids: &[u64]) -> Result<Vec<Arc<Mutex<()>>>> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| SettlementError::Persistence("lock registry poisoned".into()))?;
        Ok(robot_ids
            .iter()
            .map(|robot_id| Arc::clone(registry.entry(*robot_id).or_default()))
            .collect())
    }
}

// ============================================
// Staged Settlement
// ============================================

/// Everything a battle settlement wants to write, computed before any store
/// is touched.
struct Staged {
    outcome: BattleOutcome,
    records: Vec<RobotRecord>,
    participants: Vec<SettlementRecord>,
    revenue: Vec<RevenueRecord>,
    stable_awards: Vec<StableAward>,
}

struct SideStage<'a> {
    side: &'a SideReport,
    result: FightResult,
    rating_delta: i32,
}

#[derive(Default)]
struct StagedParts {
    participants: Vec<SettlementRecord>,
    revenue: Vec<RevenueRecord>,
    stable_awards: Vec<StableAward>,
}

fn record_ref(records: &FxHashMap<u64, RobotRecord>, robot_id: u64) -> Result<&RobotRecord> {
    records.get(&robot_id).ok_or(SettlementError::UnknownRobot { robot_id })
}

fn side_rating(records: &FxHashMap<u64, RobotRecord>, side: &SideReport) -> Result<i32> {
    let mut total = 0;
    for fighter in side.fighters() {
        total += record_ref(records, fighter.robot_id)?.rating;
    }
    Ok(total)
}

// ============================================
// Cycle Pipeline
// ============================================

pub struct CyclePipeline<P, D, A> {
    participants: P,
    facilities: D,
    audit: A,
    ledger: Mutex<RevenueLedger>,
    sequencer: CycleSequencer,
    locks: SettlementLocks,
    /// Serializes sequence issuance with the append that uses it.
    emit: Mutex<()>,
    revenue: RevenueCalculator,
    team_revenue: TeamRevenueAggregator,
    rewards: RewardCalculator,
    rating: RatingCalculator,
    repair: RepairCalculator,
}

impl CyclePipeline<MemoryParticipantStore, MemoryStudioDirectory, MemoryAuditSink> {
    /// Pipeline wired to fresh in-memory collaborators.
    pub fn in_memory(config: EconomyConfig) -> Self {
        Self::new(
            config,
            MemoryParticipantStore::new(),
            MemoryStudioDirectory::new(),
            MemoryAuditSink::new(),
        )
    }
}

impl<P, D, A> CyclePipeline<P, D, A>
where
    P: ParticipantStore + Sync,
    D: StudioDirectory + Sync,
    A: AuditSink + Sync,
{
    pub fn new(config: EconomyConfig, participants: P, facilities: D, audit: A) -> Self {
        Self {
            revenue: RevenueCalculator::from_config(&config),
            team_revenue: TeamRevenueAggregator::from_config(&config),
            rewards: RewardCalculator::from_config(&config),
            rating: RatingCalculator::from_config(&config),
            repair: RepairCalculator::from_config(&config),
            participants,
            facilities,
            audit,
            ledger: Mutex::new(RevenueLedger::new()),
            sequencer: CycleSequencer::new(),
            locks: SettlementLocks::default(),
            emit: Mutex::new(()),
        }
    }

    pub fn participant_store(&self) -> &P {
        &self.participants
    }

    pub fn studio_directory(&self) -> &D {
        &self.facilities
    }

    pub fn audit_sink(&self) -> &A {
        &self.audit
    }

    /// Ledger rows for one cycle, ordered by key.
    pub fn ledger_rows(&self, cycle_number: u32) -> Result<Vec<LedgerEntry>> {
        let ledger = self.lock_ledger()?;
        Ok(ledger.cycle_rows(cycle_number).into_iter().cloned().collect())
    }

    /// Total streaming revenue paid in one cycle.
    pub fn ledger_total(&self, cycle_number: u32) -> Result<i64> {
        Ok(self.lock_ledger()?.cycle_total(cycle_number))
    }

    pub fn save_ledger(&self, path: &Path) -> Result<()> {
        self.lock_ledger()?.save_to_path(path)?;
        Ok(())
    }

    /// Settle one battle end to end and return its audit event.
    pub fn settle(&self, report: &BattleReport) -> Result<AuditEvent> {
        let outcome = OutcomeResolver::resolve(report)?;
        let verdict = outcome.verdict;

        // Per-robot mutual exclusion for the whole mutation unit. Sorted
        // acquisition keeps concurrent settlements deadlock free.
        let mut robot_ids = report.robot_ids();
        robot_ids.sort_unstable();
        let handles = self.locks.handles(&robot_ids)?;
        let mut guards = Vec::with_capacity(handles.len());
        for handle in &handles {
            guards.push(
                handle
                    .lock()
                    .map_err(|_| SettlementError::Persistence("settlement lock poisoned".into()))?,
            );
        }

        let staged = self.stage(report, outcome)?;
        let event = self.commit(report.cycle_number, staged)?;
        log::info!(
            "Settled battle {} in cycle {}: {}",
            report.battle_id,
            report.cycle_number,
            verdict
        );
        Ok(event)
    }

    /// Settle every report of one cycle, in parallel, bracketed by cycle
    /// start/complete audit events. Failed settlements are reported in the
    /// summary, never dropped.
    pub fn settle_cycle(
        &self,
        cycle_number: u32,
        reports: &[BattleReport],
    ) -> Result<CycleSummary> {
        let scheduled = reports.len() as u32;
        self.emit_marker(AuditEvent::cycle_start(cycle_number, 0, scheduled), cycle_number)?;
        log::info!("Cycle {} start: {} battles scheduled", cycle_number, scheduled);

        let results: Vec<(Uuid, Result<AuditEvent>)> = reports
            .par_iter()
            .map(|report| {
                let settled = if report.cycle_number == cycle_number {
                    self.settle(report)
                } else {
                    Err(SettlementError::CycleMismatch {
                        expected: cycle_number,
                        found: report.cycle_number,
                    })
                };
                (report.battle_id, settled)
            })
            .collect();

        let mut summary = CycleSummary { cycle_number, scheduled, ..CycleSummary::default() };
        for (battle_id, settled) in results {
            match settled {
                Ok(event) => {
                    summary.settled += 1;
                    if let Some(payload) = event.battle_payload() {
                        if payload.outcome.is_bye {
                            summary.byes += 1;
                        } else if payload.outcome.verdict.is_draw() {
                            summary.draws += 1;
                        } else {
                            summary.decisive += 1;
                        }
                        summary.total_revenue_paid += payload
                            .revenue
                            .iter()
                            .map(|record| record.breakdown.total_revenue)
                            .sum::<i64>();
                    }
                }
                Err(err) => {
                    log::warn!("Battle {} failed to settle: {}", battle_id, err);
                    summary.failed += 1;
                    summary.failures.push(FailedSettlement {
                        battle_id,
                        error: err.to_string(),
                        retryable: err.is_retryable(),
                    });
                }
            }
        }

        self.emit_marker(
            AuditEvent::cycle_complete(cycle_number, 0, summary.clone()),
            cycle_number,
        )?;
        self.sequencer.reset_cycle(cycle_number)?;
        log::info!(
            "Cycle {} complete: {} settled, {} failed, {} streaming revenue paid",
            cycle_number,
            summary.settled,
            summary.failed,
            summary.total_revenue_paid
        );
        Ok(summary)
    }

    // ============================================
    // Staging
    // ============================================

    fn stage(&self, report: &BattleReport, outcome: BattleOutcome) -> Result<Staged> {
        let mut records: FxHashMap<u64, RobotRecord> = FxHashMap::default();
        for robot_id in report.robot_ids() {
            records.insert(robot_id, self.participants.fetch(robot_id)?);
        }

        // One facility read per stable; a missing stable aborts here, before
        // any counter moves.
        let mut facilities: FxHashMap<u64, StableFacilities> = FxHashMap::default();
        for record in records.values() {
            if !facilities.contains_key(&record.stable_id) {
                facilities.insert(record.stable_id, self.facilities.facilities(record.stable_id)?);
            }
        }

        // Rating deltas from pre-battle ratings. A bye opponent counts as a
        // default-rated phantom per robot, so even bye wins move ratings.
        let result_a = outcome.verdict.result_for(SideId::A);
        let rating_a = side_rating(&records, &report.side_a)?;
        let rating_b = match &report.side_b {
            Some(side_b) => side_rating(&records, side_b)?,
            None => BYE_ROBOT_RATING * report.side_a.fighters().len() as i32,
        };
        let (delta_a, delta_b) = self.rating.rating_changes(rating_a, rating_b, result_a);

        let mut parts = StagedParts::default();
        self.stage_side(
            report,
            SideStage { side: &report.side_a, result: result_a, rating_delta: delta_a },
            &mut records,
            &facilities,
            &mut parts,
        )?;
        if let Some(side_b) = &report.side_b {
            self.stage_side(
                report,
                SideStage {
                    side: side_b,
                    result: outcome.verdict.result_for(SideId::B),
                    rating_delta: delta_b,
                },
                &mut records,
                &facilities,
                &mut parts,
            )?;
        }

        Ok(Staged {
            outcome,
            records: records.into_values().collect(),
            participants: parts.participants,
            revenue: parts.revenue,
            stable_awards: parts.stable_awards,
        })
    }

    fn stage_side(
        &self,
        report: &BattleReport,
        stage: SideStage<'_>,
        records: &mut FxHashMap<u64, RobotRecord>,
        facilities: &FxHashMap<u64, StableFacilities>,
        parts: &mut StagedParts,
    ) -> Result<()> {
        let is_bye = report.is_bye();
        let kind = report.kind;
        let result = stage.result;

        let fighters = match stage.side {
            SideReport::Solo(fighter) => vec![(fighter, ParticipantRole::Solo, false, false)],
            SideReport::Team(team) => {
                let tagged = team.tag_out_occurred();
                vec![
                    (&team.active, ParticipantRole::TeamActive, false, tagged),
                    (&team.reserve, ParticipantRole::TeamReserve, tagged, false),
                ]
            }
        };

        let league_points_delta = match kind {
            BattleKind::League | BattleKind::TagTeam => self.rewards.league_points_delta(result),
            BattleKind::Tournament(_) => 0,
        };

        // The side's stable and tier. Teams compete at their strongest
        // member's tier and are owned by the active robot's stable.
        let stable_id = record_ref(records, fighters[0].0.robot_id)?.stable_id;
        let side_tier = match stage.side {
            SideReport::Solo(fighter) => record_ref(records, fighter.robot_id)?.league,
            SideReport::Team(team) => {
                let active = record_ref(records, team.active.robot_id)?.league;
                let reserve = record_ref(records, team.reserve.robot_id)?.league;
                active.max(reserve)
            }
        };
        let side_facilities = facilities
            .get(&stable_id)
            .copied()
            .ok_or(SettlementError::StudioUnavailable { stable_id })?;

        for (fighter, role, tagged_in, tagged_out) in fighters {
            let robot_id = fighter.robot_id;
            let record = records
                .get_mut(&robot_id)
                .ok_or(SettlementError::UnknownRobot { robot_id })?;
            let own_facilities = facilities
                .get(&record.stable_id)
                .copied()
                .ok_or(SettlementError::StudioUnavailable { stable_id: record.stable_id })?;

            // Winners earn fame by format; byes award none.
            let fame_awarded = if is_bye {
                0
            } else {
                match kind {
                    BattleKind::League => self.rewards.league_fame(
                        record.league,
                        fighter.final_hp,
                        record.max_hp,
                        result,
                    ),
                    BattleKind::TagTeam => self.rewards.tag_team_fame(
                        record.league,
                        fighter.damage_dealt,
                        fighter.survival_seconds,
                        report.duration_seconds,
                        result,
                    ),
                    BattleKind::Tournament(context) => self.rewards.tournament_fame(
                        record.league,
                        fighter.final_hp,
                        record.max_hp,
                        context.round,
                        result,
                    ),
                }
            };

            let battles_before = record.total_battle_count();
            let fame_before = record.fame;
            let rating_before = record.rating;
            let league_points_before = record.league_points;

            let participation = BattleParticipation::new(kind, role, result)
                .with_fame(fame_awarded)
                .with_rating_change(stage.rating_delta)
                .with_league_points(league_points_delta)
                .with_tag_transition(tagged_in, tagged_out);
            let receipt = StatAccrual::apply_post_battle_counters(record, &participation);
            debug_assert_eq!(receipt.battles_after, battles_before + 1);

            parts.participants.push(SettlementRecord {
                robot_id,
                role,
                battles_before,
                battles_after: receipt.battles_after,
                fame_before,
                fame_after: receipt.fame_after,
                fame_awarded,
                rating_before,
                rating_after: record.rating,
                league_points_before,
                league_points_after: record.league_points,
                repair_cost: self.repair.repair_cost(
                    record.max_hp,
                    fighter.final_hp,
                    own_facilities.repair_bay_level,
                ),
                destroyed: fighter.is_down(),
                tagged_out,
                tagged_in,
            });
        }

        let is_finals =
            matches!(kind, BattleKind::Tournament(context) if context.round >= FINALS_ROUND);
        let credits = match kind {
            BattleKind::TagTeam => self.rewards.tag_team_reward(side_tier, result),
            BattleKind::League | BattleKind::Tournament(_) => self.rewards.solo_reward(result),
        };
        let prestige = if is_bye {
            0
        } else {
            self.rewards.prestige_award(&kind, side_tier, result, is_finals)
        };
        parts.stable_awards.push(StableAward { stable_id, credits, prestige });

        // Streaming revenue reads only the post-accrual counters written
        // above. Bye battles pay nothing.
        if !is_bye {
            match stage.side {
                SideReport::Solo(fighter) => {
                    let record = record_ref(records, fighter.robot_id)?;
                    if let Some(breakdown) = self.revenue.calculate(
                        record.total_battle_count(),
                        record.fame,
                        side_facilities.studio_level,
                        false,
                    ) {
                        parts.revenue.push(RevenueRecord {
                            key: LedgerKey::Robot(record.robot_id),
                            breakdown,
                            max_battles_robot_id: None,
                            max_fame_robot_id: None,
                        });
                    }
                }
                SideReport::Team(team) => {
                    let roster = [
                        RobotCounters::from_record(record_ref(records, team.active.robot_id)?),
                        RobotCounters::from_record(record_ref(records, team.reserve.robot_id)?),
                    ];
                    if let Some(team_revenue) =
                        self.team_revenue.team_payout(&roster, side_facilities.studio_level, false)
                    {
                        parts.revenue.push(RevenueRecord {
                            key: LedgerKey::Stable(stable_id),
                            breakdown: team_revenue.breakdown,
                            max_battles_robot_id: Some(team_revenue.max_battles_robot_id),
                            max_fame_robot_id: Some(team_revenue.max_fame_robot_id),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    // ============================================
    // Commit
    // ============================================

    fn commit(&self, cycle_number: u32, staged: Staged) -> Result<AuditEvent> {
        {
            let mut ledger = self.lock_ledger()?;

            // Pre-check every ledger write so nothing can fail after the
            // participant commit has gone through.
            let mut projected: FxHashMap<LedgerKey, (i64, u32)> = FxHashMap::default();
            for record in &staged.revenue {
                if record.breakdown.total_revenue < 0 {
                    return Err(SettlementError::LedgerWrite(format!(
                        "negative revenue for {}",
                        record.key
                    )));
                }
                let current = match projected.get(&record.key) {
                    Some(planned) => *planned,
                    None => ledger
                        .entry(record.key, cycle_number)
                        .map(|row| (row.streaming_revenue, row.battles_in_cycle))
                        .unwrap_or((0, 0)),
                };
                let next_revenue = current
                    .0
                    .checked_add(record.breakdown.total_revenue)
                    .ok_or_else(|| {
                        SettlementError::LedgerWrite(format!("revenue overflow for {}", record.key))
                    })?;
                let next_battles = current.1.checked_add(1).ok_or_else(|| {
                    SettlementError::LedgerWrite(format!(
                        "battle counter overflow for {}",
                        record.key
                    ))
                })?;
                projected.insert(record.key, (next_revenue, next_battles));
            }

            self.participants.commit(staged.records)?;

            for record in &staged.revenue {
                ledger.record_or_accumulate(
                    record.key,
                    cycle_number,
                    record.breakdown.total_revenue,
                    1,
                )?;
            }
        }

        // Sequence issuance and append stay one critical section, so the
        // sink always sees increasing numbers.
        let _emit = self
            .emit
            .lock()
            .map_err(|_| SettlementError::AuditAppend("emit lock poisoned".into()))?;
        let sequence = self.sequencer.next_sequence(cycle_number)?;
        let event = AuditEvent::battle(
            cycle_number,
            sequence,
            BattleAuditPayload {
                outcome: staged.outcome,
                revenue: staged.revenue,
                participants: staged.participants,
                stable_awards: staged.stable_awards,
            },
        );
        self.audit.append(event.clone())?;
        Ok(event)
    }

    /// Stamp and append a cycle lifecycle marker.
    fn emit_marker(&self, template: AuditEvent, cycle_number: u32) -> Result<()> {
        let _emit = self
            .emit
            .lock()
            .map_err(|_| SettlementError::AuditAppend("emit lock poisoned".into()))?;
        let mut event = template;
        event.sequence_number = self.sequencer.next_sequence(cycle_number)?;
        self.audit.append(event)
    }

    fn lock_ledger(&self) -> Result<std::sync::MutexGuard<'_, RevenueLedger>> {
        self.ledger
            .lock()
            .map_err(|_| SettlementError::Persistence("ledger lock poisoned".into()))
    }
}

// ============================================
// Tests
// ============================================
