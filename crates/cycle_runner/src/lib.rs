//! Cycle Runner Library
//!
//! 사이클 입력 JSON → 정산 파이프라인 → 사이클 아카이브 변환
//! 시드 데모 사이클 생성과 아카이브 중계 재생 지원

use anyhow::{Context, Result};
use orl_core::models::{BattleReport, RobotRecord};
use orl_core::scenario::{load_shape, DemoCycle};
use orl_core::{
    read_archive, write_archive, BattleCommentator, CyclePipeline, EconomyConfig, ParticipantStore,
    ScenarioBuilder, StableFacilities,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// Re-export the archive container for CLI consumers
pub use orl_core::CycleArchive;

/// 입력 파일 스키마 버전
pub const INPUT_SCHEMA_VERSION: &str = "v1";

/// 스테이블 시설 레벨 한 줄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableEntry {
    pub stable_id: u64,
    pub studio_level: u32,
    pub repair_bay_level: u32,
}

impl StableEntry {
    pub fn facilities(&self) -> StableFacilities {
        StableFacilities::new(self.studio_level, self.repair_bay_level)
    }
}

/// 한 사이클 정산에 필요한 전체 입력: 로스터, 시설, 전투 리포트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleInput {
    /// 스키마 버전 (예: "v1")
    pub schema_version: String,
    pub cycle_number: u32,
    pub robots: Vec<RobotRecord>,
    pub stables: Vec<StableEntry>,
    pub reports: Vec<BattleReport>,
}

impl From<DemoCycle> for CycleInput {
    fn from(cycle: DemoCycle) -> Self {
        Self {
            schema_version: INPUT_SCHEMA_VERSION.to_string(),
            cycle_number: cycle.cycle_number,
            robots: cycle.robots,
            stables: cycle
                .stables
                .into_iter()
                .map(|(stable_id, facilities)| StableEntry {
                    stable_id,
                    studio_level: facilities.studio_level,
                    repair_bay_level: facilities.repair_bay_level,
                })
                .collect(),
            reports: cycle.reports,
        }
    }
}

/// 정산 런 리포트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// 입력 스키마 버전 (예: "v1")
    pub schema_version: String,
    pub cycle_number: u32,
    /// 예정된 전투 수
    pub scheduled: u32,
    /// 정산 완료된 전투 수
    pub settled: u32,
    /// 정산 실패한 전투 수
    pub failed: u32,
    /// 사이클 총 스트리밍 수익 (크레딧)
    pub total_revenue_paid: i64,
    /// 사이클 원장 행 수
    pub ledger_rows: usize,
    /// 아카이브에 담긴 감사 이벤트 수
    pub audit_events: usize,
    /// 아카이브 파일 크기 (bytes)
    pub archive_size: u64,
    /// 생성 시각 (RFC3339 형식)
    pub created_at: String,
}

/// 사이클 입력 JSON 파일 로드
pub fn read_input(path: &Path) -> Result<CycleInput> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let input: CycleInput =
        serde_json::from_str(&json).context("Failed to parse cycle input JSON")?;
    Ok(input)
}

/// 시드 데모 사이클 입력 생성
///
/// # Arguments
///
/// * `seed` - RNG 시드 (같은 시드는 같은 사이클을 만든다)
/// * `cycle_number` - 모든 리포트에 찍을 사이클 번호
/// * `shape_yaml` - 시나리오 형태 YAML 경로 (None이면 내장 표준 형태)
pub fn demo_input(seed: u64, cycle_number: u32, shape_yaml: Option<&Path>) -> Result<CycleInput> {
    // 1. 시나리오 형태 결정
    let mut builder = match shape_yaml {
        Some(path) => {
            let yaml = fs::read_to_string(path)
                .with_context(|| format!("Failed to read shape file: {}", path.display()))?;
            let shape = load_shape(&yaml).context("Failed to parse scenario shape YAML")?;
            // 내장 형태가 아닌 YAML은 분포 파라미터를 먼저 검증한다.
            if !shape.damage_mean.is_finite()
                || !shape.damage_std.is_finite()
                || shape.damage_std < 0.0
            {
                anyhow::bail!(
                    "Invalid damage distribution in shape '{}': mean {}, std {}",
                    shape.name,
                    shape.damage_mean,
                    shape.damage_std
                );
            }
            ScenarioBuilder::with_shape(seed, shape)
        }
        None => ScenarioBuilder::new(seed),
    };

    // 2. 사이클 생성
    Ok(CycleInput::from(builder.build_cycle(cycle_number)))
}

/// 사이클 입력을 정산하고 아카이브 파일로 기록
///
/// # Arguments
///
/// * `input` - 사이클 입력 (로스터, 시설, 리포트)
/// * `archive_out` - 출력 아카이브 파일 경로
/// * `ledger_out` - 원장 스냅샷 JSON 경로 (옵션)
///
/// # Returns
///
/// 정산 런 리포트
pub fn settle_input(
    input: &CycleInput,
    archive_out: &Path,
    ledger_out: Option<&Path>,
) -> Result<RunReport> {
    // 1. 스키마 버전 게이트
    if input.schema_version != INPUT_SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported input schema version: {} (expected {})",
            input.schema_version,
            INPUT_SCHEMA_VERSION
        );
    }

    // 2. 인메모리 파이프라인 구성
    let pipeline = CyclePipeline::in_memory(EconomyConfig::standard());
    for stable in &input.stables {
        pipeline.studio_directory().register(stable.stable_id, stable.facilities())?;
    }
    pipeline.participant_store().commit(input.robots.clone())?;

    // 3. 사이클 정산
    let summary = pipeline.settle_cycle(input.cycle_number, &input.reports)?;

    // 4. 아카이브 기록 (MsgPack+LZ4, 체크섬 트레일러)
    let events = pipeline.audit_sink().events()?;
    let ledger_rows = pipeline.ledger_rows(input.cycle_number)?;
    let archive = CycleArchive::new(input.cycle_number, summary.clone(), events, ledger_rows);
    write_archive(archive_out, &archive)?;

    // 5. 원장 스냅샷 (옵션)
    if let Some(path) = ledger_out {
        pipeline.save_ledger(path)?;
    }

    // 6. 런 리포트 생성
    let archive_size = fs::metadata(archive_out)
        .with_context(|| format!("Failed to stat archive: {}", archive_out.display()))?
        .len();

    Ok(RunReport {
        schema_version: input.schema_version.clone(),
        cycle_number: summary.cycle_number,
        scheduled: summary.scheduled,
        settled: summary.settled,
        failed: summary.failed,
        total_revenue_paid: summary.total_revenue_paid,
        ledger_rows: archive.ledger_rows.len(),
        audit_events: archive.events.len(),
        archive_size,
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// 아카이브 파일 로드 (체크섬과 사이클 일관성 검증 포함)
pub fn load_archive(path: &Path) -> Result<CycleArchive> {
    let archive = read_archive(path)
        .with_context(|| format!("Failed to read archive: {}", path.display()))?;
    Ok(archive)
}

/// 로스터 이름 표 (robot_id → 이름)
pub fn roster_names(input: &CycleInput) -> HashMap<u64, String> {
    input.robots.iter().map(|robot| (robot.robot_id, robot.name.clone())).collect()
}

/// 아카이브의 전투 이벤트를 중계 문장으로 재생
///
/// 요청 로케일은 내장 로케일과 협상한다. 이름 표에 없는 로봇은
/// `Robot {id}` 자리표시로 나온다.
pub fn narrate_cycle(
    archive: &CycleArchive,
    names: &HashMap<u64, String>,
    requested_locales: &[String],
    seed: u64,
) -> Result<Vec<String>> {
    let mut commentator = BattleCommentator::new(seed);
    let locale = commentator.negotiate_locale(requested_locales);
    commentator
        .set_locale(&locale)
        .with_context(|| format!("Negotiated locale {} is not loaded", locale))?;

    let mut lines = Vec::new();
    for event in &archive.events {
        if let Some(payload) = event.battle_payload() {
            lines.extend(commentator.narrate(payload, names));
        }
    }
    Ok(lines)
}
