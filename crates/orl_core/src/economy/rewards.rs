//! 전투 보상 계산
//!
//! 크레딧, 리그 포인트, 명성, 위신을 전투 형식별로 계산한다.
//!
//! ## 형식별 규칙
//!
//! - 1v1 리그전: 고정 크레딧(승 1000 / 패 300 / 무 500). 승자 명성은 리그
//!   기본치에 퍼포먼스 배수를 곱한 값. 위신 없음
//! - 태그팀전: 리그 구간 보상의 2배. 승자 명성은 기여도(피해량, 생존 시간)
//!   기반, 승리 스테이블에 위신 1.6배
//! - 토너먼트전: 승자에게만 명성(퍼포먼스 배수 x 라운드 배수)과 위신 2배,
//!   결승 승리 시 위신 보너스
//!
//! 명성과 위신은 이긴 쪽만 받는다. 패배와 무승부는 항상 0.

use super::config::{EconomyConfig, RewardParams};
use crate::models::{BattleKind, FightResult, LeagueTier};

// ============================================================================
// Tournament Constants
// ============================================================================

/// 토너먼트 명성 배율
const TOURNAMENT_FAME_MULTIPLIER: f64 = 1.5;
/// 토너먼트 위신 배율
const TOURNAMENT_PRESTIGE_MULTIPLIER: f64 = 2.0;
/// 결승 승리 위신 보너스
const CHAMPIONSHIP_PRESTIGE_BONUS: u64 = 500;
/// 태그팀 기여도 명성의 승자 배율
const WINNER_FAME_MULTIPLIER: f64 = 1.2;

/// 라운드가 깊을수록 명성이 커진다. 표 밖의 라운드는 1.0.
fn round_multiplier(round: u32) -> f64 {
    match round {
        2 => 1.2,
        3 => 1.4,
        4 => 1.6,
        5 => 2.0,
        _ => 1.0,
    }
}

/// 승리 퍼포먼스 배수: 무피해 2.0, HP 80% 초과 1.5, 20% 미만 역전승 1.25.
fn performance_multiplier(final_hp: f64, max_hp: f64) -> f64 {
    if max_hp <= 0.0 {
        return 1.0;
    }
    let hp_percent = final_hp / max_hp;
    if final_hp >= max_hp {
        2.0
    } else if hp_percent > 0.8 {
        1.5
    } else if hp_percent < 0.2 {
        1.25
    } else {
        1.0
    }
}

// ============================================================================
// League Reward Bands
// ============================================================================

/// 리그별 기본 보상 구간 (최소, 최대).
fn league_reward_band(league: LeagueTier) -> (i64, i64) {
    match league {
        LeagueTier::Bronze => (5_000, 10_000),
        LeagueTier::Silver => (10_000, 20_000),
        LeagueTier::Gold => (20_000, 40_000),
        LeagueTier::Platinum => (40_000, 80_000),
        LeagueTier::Diamond => (80_000, 150_000),
        LeagueTier::Champion => (150_000, 300_000),
    }
}

/// 구간 중간값.
fn league_midpoint(league: LeagueTier) -> i64 {
    let (min, max) = league_reward_band(league);
    (min + max) / 2
}

/// 참가 보상: 구간 최소값의 30%.
fn participation_reward(league: LeagueTier) -> i64 {
    let (min, _) = league_reward_band(league);
    (min as f64 * 0.3).round() as i64
}

// ============================================================================
// RewardCalculator
// ============================================================================

#[derive(Debug, Clone)]
pub struct RewardCalculator {
    params: RewardParams,
}

impl RewardCalculator {
    pub fn new(params: RewardParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.rewards.clone())
    }

    /// 1v1, 토너먼트전 크레딧 보상.
    pub fn solo_reward(&self, result: FightResult) -> i64 {
        match result {
            FightResult::Win => self.params.win,
            FightResult::Loss => self.params.loss,
            FightResult::Draw => self.params.draw,
        }
    }

    /// 태그팀전 크레딧 보상. 승리는 중간값 + 참가 보상, 패배와 무승부는
    /// 참가 보상만, 이후 태그팀 배율 적용.
    pub fn tag_team_reward(&self, league: LeagueTier, result: FightResult) -> i64 {
        let base = match result {
            FightResult::Win => league_midpoint(league) + participation_reward(league),
            FightResult::Loss | FightResult::Draw => participation_reward(league),
        };
        (base as f64 * self.params.tag_multiplier).round() as i64
    }

    /// 리그 포인트 증감량.
    pub fn league_points_delta(&self, result: FightResult) -> i32 {
        match result {
            FightResult::Win => self.params.league_points_win,
            FightResult::Loss => self.params.league_points_loss,
            FightResult::Draw => self.params.league_points_draw,
        }
    }

    /// 리그 포인트 적용. 0 밑으로는 내려가지 않는다.
    pub fn apply_league_points(&self, current: u32, result: FightResult) -> u32 {
        let delta = self.league_points_delta(result);
        if delta >= 0 {
            current.saturating_add(delta as u32)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        }
    }

    /// 1v1 리그전 승자 명성. 패배와 무승부는 0.
    pub fn league_fame(
        &self,
        league: LeagueTier,
        final_hp: f64,
        max_hp: f64,
        result: FightResult,
    ) -> u64 {
        if !result.is_win() {
            return 0;
        }
        let base = league.base_fame() as f64;
        (base * performance_multiplier(final_hp, max_hp)).round() as u64
    }

    /// 태그팀 기여도 명성. 승자만 받는다.
    ///
    /// # Arguments
    /// * `damage_dealt` - 이 로봇이 가한 총 피해량
    /// * `survival_seconds` - 전장에 있었던 시간
    /// * `battle_seconds` - 전투 전체 길이
    pub fn tag_team_fame(
        &self,
        league: LeagueTier,
        damage_dealt: f64,
        survival_seconds: u32,
        battle_seconds: u32,
        result: FightResult,
    ) -> u64 {
        if !result.is_win() {
            return 0;
        }

        let base = league.base_fame() as f64;
        let damage_mult = (damage_dealt / 100.0).clamp(0.5, 1.5);
        // 0초 전투는 전체 생존으로 본다.
        let survival_ratio = if battle_seconds == 0 {
            1.0
        } else {
            survival_seconds as f64 / battle_seconds as f64
        };
        let survival_mult = survival_ratio.clamp(0.5, 1.5);

        (base * damage_mult * survival_mult * WINNER_FAME_MULTIPLIER).round() as u64
    }

    /// 토너먼트 승자 명성. 퍼포먼스 배수에 라운드 배수까지 얹는다.
    pub fn tournament_fame(
        &self,
        league: LeagueTier,
        final_hp: f64,
        max_hp: f64,
        round: u32,
        result: FightResult,
    ) -> u64 {
        if !result.is_win() {
            return 0;
        }

        let base = league.base_fame() as f64 * performance_multiplier(final_hp, max_hp);
        (base * TOURNAMENT_FAME_MULTIPLIER * round_multiplier(round)).round() as u64
    }

    /// 스테이블 위신. 승자만 받는다.
    ///
    /// `is_finals`는 토너먼트 결승 여부. 다른 형식에서는 무시된다.
    pub fn prestige_award(
        &self,
        kind: &BattleKind,
        league: LeagueTier,
        result: FightResult,
        is_finals: bool,
    ) -> u64 {
        if !result.is_win() {
            return 0;
        }

        let base = league.base_prestige() as f64;
        match kind {
            BattleKind::League => 0,
            BattleKind::TagTeam => {
                (base * self.params.tag_prestige_multiplier).round() as u64
            }
            BattleKind::Tournament(_) => {
                let mut prestige = (base * TOURNAMENT_PRESTIGE_MULTIPLIER).round() as u64;
                if is_finals {
                    prestige += CHAMPIONSHIP_PRESTIGE_BONUS;
                }
                prestige
            }
        }
    }
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(RewardParams::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
