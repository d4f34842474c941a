//! 데모 시나리오 생성기
//!
//! 러너의 `demo` 서브커맨드와 테스트가 쓰는 전투 리포트 배치를 만든다.
//! ChaCha8 시드 RNG만 쓰므로 같은 시드는 항상 같은 로스터와 같은
//! 리포트를 돌려준다. 배틀 ID까지 RNG에서 뽑는다.
//!
//! 시나리오 형태(리그/태그/토너먼트/부전승 구성)는 YAML로 기술하고,
//! 기본 형태 두 개는 컴파일 타임에 임베딩한다.

use crate::models::{
    BattleReport, FighterReport, LeagueTier, RobotRecord, SideReport, TeamSideReport,
    TournamentContext, INITIAL_RATING,
};
use crate::pipeline::StableFacilities;
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// 정규 경기 시간 한도 (초).
pub const BATTLE_TIME_LIMIT: u32 = 180;

// ============================================================================
// 임베딩 시나리오 데이터
// ============================================================================

/// 표준 리그 나이트 YAML (컴파일 타임 임베딩)
pub const STANDARD_CYCLE_YAML: &str =
    include_str!("../../../../data/scenarios/standard_cycle.yaml");

/// 태그팀 쇼케이스 YAML (컴파일 타임 임베딩)
pub const TAG_SHOWCASE_YAML: &str = include_str!("../../../../data/scenarios/tag_showcase.yaml");

static STANDARD_SHAPE: OnceLock<ScenarioShape> = OnceLock::new();

/// 표준 시나리오 형태. 최초 호출 시 YAML 파싱, 이후 캐시.
///
/// # Panics
///
/// 컴파일 타임에 임베딩된 YAML이므로 정상적인 빌드에서는 파싱 실패가
/// 발생하지 않는다.
pub fn standard_shape() -> &'static ScenarioShape {
    STANDARD_SHAPE.get_or_init(|| {
        serde_yaml::from_str(STANDARD_CYCLE_YAML).expect("Failed to parse standard_cycle.yaml")
    })
}

/// 외부 YAML에서 시나리오 형태 로드.
pub fn load_shape(yaml: &str) -> Result<ScenarioShape, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

// ============================================================================
// 데모 테이블
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Chassis {
    max_hp: f64,
}

static CHASSIS_TABLE: Lazy<Vec<Chassis>> = Lazy::new(|| {
    vec![
        Chassis { max_hp: 80.0 },
        Chassis { max_hp: 100.0 },
        Chassis { max_hp: 130.0 },
        Chassis { max_hp: 160.0 },
    ]
});

static NAME_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec!["Iron", "Crimson", "Vortex", "Rust", "Titan", "Volt", "Onyx", "Gale", "Ember", "Cobalt"]
});

static NAME_SUFFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec!["Fang", "Piston", "Breaker", "Warden", "Saw", "Howl", "Anvil", "Spike", "Core", "Talon"]
});

/// 하위 리그가 두텁게 나오도록 가중치를 둔 사다리.
static LEAGUE_LADDER: Lazy<Vec<LeagueTier>> = Lazy::new(|| {
    vec![
        LeagueTier::Bronze,
        LeagueTier::Bronze,
        LeagueTier::Bronze,
        LeagueTier::Bronze,
        LeagueTier::Silver,
        LeagueTier::Silver,
        LeagueTier::Silver,
        LeagueTier::Gold,
        LeagueTier::Gold,
        LeagueTier::Platinum,
        LeagueTier::Diamond,
        LeagueTier::Champion,
    ]
});

// ============================================================================
// 시나리오 형태
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioShape {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub league_battles: u32,
    pub tag_battles: u32,
    pub tournament_battles: u32,
    pub byes: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u32,
    pub damage_mean: f64,
    pub damage_std: f64,
}

fn default_time_limit() -> u32 {
    BATTLE_TIME_LIMIT
}

impl ScenarioShape {
    pub fn battle_count(&self) -> u32 {
        self.league_battles + self.tag_battles + self.tournament_battles + self.byes
    }
}

// ============================================================================
// 생성 결과
// ============================================================================

/// 한 사이클 분량의 데모 데이터: 로스터, 스테이블 시설, 전투 리포트.
#[derive(Debug, Clone, Default)]
pub struct DemoCycle {
    pub cycle_number: u32,
    pub robots: Vec<RobotRecord>,
    pub stables: Vec<(u64, StableFacilities)>,
    pub reports: Vec<BattleReport>,
}

// ============================================================================
// 빌더
// ============================================================================

pub struct ScenarioBuilder {
    rng: ChaCha8Rng,
    shape: ScenarioShape,
    damage: Normal<f64>,
    next_robot_id: u64,
    next_stable_id: u64,
}

impl ScenarioBuilder {
    /// 표준 형태로 시드 빌더 생성.
    pub fn new(seed: u64) -> Self {
        Self::with_shape(seed, standard_shape().clone())
    }

    /// # Panics
    ///
    /// 형태의 damage 파라미터가 정규분포를 만들 수 없는 값이면 패닉.
    /// 임베딩 형태는 항상 유효하다.
    pub fn with_shape(seed: u64, shape: ScenarioShape) -> Self {
        let damage = Normal::new(shape.damage_mean, shape.damage_std)
            .expect("scenario damage distribution parameters invalid");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            shape,
            damage,
            next_robot_id: 1,
            next_stable_id: 1,
        }
    }

    pub fn shape(&self) -> &ScenarioShape {
        &self.shape
    }

    /// 형태에 기술된 구성대로 한 사이클을 만든다.
    pub fn build_cycle(&mut self, cycle_number: u32) -> DemoCycle {
        let mut cycle = DemoCycle { cycle_number, ..DemoCycle::default() };

        for _ in 0..self.shape.league_battles {
            let a = self.enroll_robot(&mut cycle, None);
            let b = self.enroll_robot(&mut cycle, None);
            let duration = self.fight_duration();
            let fighter_a = self.fight(&a, duration);
            let fighter_b = self.fight(&b, duration);
            let timed_out = fighter_a.final_hp > 0.0 && fighter_b.final_hp > 0.0;
            let report = BattleReport::solo(cycle_number, fighter_a, fighter_b)
                .with_duration(duration, timed_out);
            cycle.reports.push(self.stamp(report));
        }

        for _ in 0..self.shape.tag_battles {
            let stable_a = self.new_stable(&mut cycle);
            let a1 = self.enroll_robot(&mut cycle, Some(stable_a));
            let a2 = self.enroll_robot(&mut cycle, Some(stable_a));
            let stable_b = self.new_stable(&mut cycle);
            let b1 = self.enroll_robot(&mut cycle, Some(stable_b));
            let b2 = self.enroll_robot(&mut cycle, Some(stable_b));

            let duration = self.fight_duration();
            let side_a = self.team_side(stable_a, &a1, &a2, duration);
            let side_b = self.team_side(stable_b, &b1, &b2, duration);
            let timed_out = side_a.current().final_hp > 0.0 && side_b.current().final_hp > 0.0;
            let report = BattleReport::tag_team(cycle_number, side_a, side_b)
                .with_duration(duration, timed_out);
            cycle.reports.push(self.stamp(report));
        }

        for _ in 0..self.shape.tournament_battles {
            let a = self.enroll_robot(&mut cycle, None);
            let b = self.enroll_robot(&mut cycle, None);
            let context = TournamentContext {
                tournament_id: self.rng.gen_range(1..=8),
                round: self.rng.gen_range(1..=5),
            };
            let duration = self.fight_duration();
            let fighter_a = self.fight(&a, duration);
            let fighter_b = self.fight(&b, duration);
            let timed_out = fighter_a.final_hp > 0.0 && fighter_b.final_hp > 0.0;
            let report = BattleReport::tournament(cycle_number, context, fighter_a, fighter_b)
                .with_duration(duration, timed_out);
            cycle.reports.push(self.stamp(report));
        }

        for _ in 0..self.shape.byes {
            let a = self.enroll_robot(&mut cycle, None);
            // 부전승은 손상 없이 그대로 통과한다.
            let side = SideReport::Solo(FighterReport::new(a.robot_id, a.max_hp, 0.0));
            let report = BattleReport::bye(cycle_number, side);
            cycle.reports.push(self.stamp(report));
        }

        cycle
    }

    fn new_stable(&mut self, cycle: &mut DemoCycle) -> u64 {
        let stable_id = self.next_stable_id;
        self.next_stable_id += 1;
        let facilities =
            StableFacilities::new(self.rng.gen_range(0..=10), self.rng.gen_range(0..=5));
        cycle.stables.push((stable_id, facilities));
        stable_id
    }

    fn enroll_robot(&mut self, cycle: &mut DemoCycle, stable: Option<u64>) -> RobotRecord {
        let stable_id = match stable {
            Some(id) => id,
            None => self.new_stable(cycle),
        };
        let robot_id = self.next_robot_id;
        self.next_robot_id += 1;

        let chassis = CHASSIS_TABLE[self.rng.gen_range(0..CHASSIS_TABLE.len())];
        let name = format!(
            "{} {}",
            NAME_PREFIXES[self.rng.gen_range(0..NAME_PREFIXES.len())],
            NAME_SUFFIXES[self.rng.gen_range(0..NAME_SUFFIXES.len())]
        );
        let league = LEAGUE_LADDER[self.rng.gen_range(0..LEAGUE_LADDER.len())];

        let mut record =
            RobotRecord::new(robot_id, stable_id, name).with_league(league).with_counters(
                self.rng.gen_range(0..400),
                self.rng.gen_range(0..80),
                self.rng.gen_range(0..5000),
            );
        record.max_hp = chassis.max_hp;
        record.rating = INITIAL_RATING + self.rng.gen_range(-250..=250);

        cycle.robots.push(record.clone());
        record
    }

    fn team_side(
        &mut self,
        team_id: u64,
        active: &RobotRecord,
        reserve: &RobotRecord,
        duration: u32,
    ) -> TeamSideReport {
        let side = TeamSideReport::new(
            team_id,
            self.fight(active, duration),
            self.fight(reserve, duration),
        );
        if self.rng.gen_bool(0.4) {
            let at = self.rng.gen_range(10..duration.max(11));
            side.with_tag_out(at)
        } else {
            side
        }
    }

    fn fight(&mut self, record: &RobotRecord, duration: u32) -> FighterReport {
        let incoming = self.damage.sample(&mut self.rng).max(0.0);
        let dealt = self.damage.sample(&mut self.rng).max(0.0);
        let final_hp = (record.max_hp - incoming).max(0.0);
        let survival =
            if final_hp <= 0.0 { self.rng.gen_range(5..=duration.max(5)) } else { duration };
        FighterReport::new(record.robot_id, final_hp, 0.0).with_damage(dealt, survival)
    }

    fn fight_duration(&mut self) -> u32 {
        let limit = self.shape.time_limit_seconds.max(30);
        self.rng.gen_range(30..=limit)
    }

    // 배틀 ID까지 시드에서 나와야 같은 시드가 같은 리포트를 만든다.
    fn stamp(&mut self, mut report: BattleReport) -> BattleReport {
        report.battle_id = Uuid::from_u128(self.rng.gen());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::EconomyConfig;
    use crate::pipeline::{CyclePipeline, ParticipantStore};

    #[test]
    fn test_same_seed_reproduces_cycle() {
        let a = ScenarioBuilder::new(42).build_cycle(1);
        let b = ScenarioBuilder::new(42).build_cycle(1);

        assert_eq!(a.reports, b.reports);
        assert_eq!(a.robots, b.robots);
        assert_eq!(a.stables, b.stables);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = ScenarioBuilder::new(1).build_cycle(1);
        let b = ScenarioBuilder::new(2).build_cycle(1);
        assert_ne!(a.reports[0].battle_id, b.reports[0].battle_id);
    }

    #[test]
    fn test_shape_mix_respected() {
        let shape = standard_shape().clone();
        let cycle = ScenarioBuilder::new(7).build_cycle(3);

        assert_eq!(cycle.reports.len() as u32, shape.battle_count());
        let byes = cycle.reports.iter().filter(|report| report.is_bye()).count() as u32;
        assert_eq!(byes, shape.byes);
        let tags =
            cycle.reports.iter().filter(|report| report.kind.is_tag_team()).count() as u32;
        assert_eq!(tags, shape.tag_battles);
        let tournaments =
            cycle.reports.iter().filter(|report| report.kind.is_tournament()).count() as u32;
        assert_eq!(tournaments, shape.tournament_battles);

        for report in &cycle.reports {
            assert_eq!(report.cycle_number, 3);
        }
    }

    #[test]
    fn test_embedded_shapes_parse() {
        let standard = standard_shape();
        assert_eq!(standard.name, "standard_cycle");
        assert_eq!(standard.league_battles, 6);
        assert_eq!(standard.byes, 1);

        let showcase = load_shape(TAG_SHOWCASE_YAML).unwrap();
        assert_eq!(showcase.name, "tag_showcase");
        assert_eq!(showcase.league_battles, 0);
        assert_eq!(showcase.tag_battles, 6);
        assert_eq!(showcase.time_limit_seconds, 300);
    }

    #[test]
    fn test_generated_reports_are_valid() {
        let cycle = ScenarioBuilder::new(99).build_cycle(1);
        for report in &cycle.reports {
            report.validate().unwrap();
        }
    }

    #[test]
    fn test_generated_cycle_settles_cleanly() {
        let cycle = ScenarioBuilder::new(11).build_cycle(1);

        let pipeline = CyclePipeline::in_memory(EconomyConfig::standard());
        for (stable_id, facilities) in &cycle.stables {
            pipeline.studio_directory().register(*stable_id, *facilities).unwrap();
        }
        pipeline.participant_store().commit(cycle.robots.clone()).unwrap();

        let summary = pipeline.settle_cycle(1, &cycle.reports).unwrap();
        assert_eq!(summary.scheduled, cycle.reports.len() as u32);
        assert_eq!(summary.failed, 0, "failures: {:?}", summary.failures);
        assert_eq!(summary.settled, summary.scheduled);
    }
}
