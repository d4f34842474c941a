//! # Economy Configuration
//!
//! 정산 파이프라인의 모든 밸런스 상수를 중앙에서 관리하는 설정 모듈.
//!
//! ## 목적
//! - 튜닝 상수 중앙 관리 (수익 공식, 보상, 수리비, 레이팅)
//! - 프리셋 지원 (Standard, Flat Studio, Showmatch)
//! - 스튜디오 배율 상수는 리터럴이 아닌 설정값 (`studio_rate`)
//!
//! ## 사용법
//! ```rust
//! use orl_core::economy::EconomyConfig;
//!
//! let config = EconomyConfig::standard();
//! let flat = EconomyConfig::flat_studio();
//! ```

use serde::{Deserialize, Serialize};

/// 스트리밍 수익 공식 파라미터
///
/// `total = floor(base × (1 + battles/battle_divisor)
///                     × (1 + fame/fame_divisor)
///                     × (1 + studio_level × studio_rate))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueParams {
    /// 기본 지급액
    pub base_amount: i64,
    /// 전투 수 배율 분모
    pub battle_divisor: f64,
    /// 명성 배율 분모
    pub fame_divisor: f64,
    /// 스튜디오 레벨당 배율 증가폭
    pub studio_rate: f64,
}

impl Default for RevenueParams {
    fn default() -> Self {
        Self { base_amount: 1000, battle_divisor: 1000.0, fame_divisor: 5000.0, studio_rate: 0.1 }
    }
}

/// 전투 보상 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardParams {
    /// 승리 보상 (크레딧)
    pub win: i64,
    /// 패배 보상
    pub loss: i64,
    /// 무승부 보상
    pub draw: i64,
    /// 태그팀 보상 배율
    pub tag_multiplier: f64,
    /// 태그팀 프레스티지 배율
    pub tag_prestige_multiplier: f64,
    /// 리그 포인트: 승리
    pub league_points_win: i32,
    /// 리그 포인트: 패배 (하한 0)
    pub league_points_loss: i32,
    /// 리그 포인트: 무승부
    pub league_points_draw: i32,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            win: 1000,
            loss: 300,
            draw: 500,
            tag_multiplier: 2.0,
            tag_prestige_multiplier: 1.6,
            league_points_win: 3,
            league_points_loss: -1,
            league_points_draw: 1,
        }
    }
}

/// 수리비 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairParams {
    /// HP 1당 수리비
    pub cost_per_hp: f64,
    /// 파괴 시 수리비 배율
    pub destruction_multiplier: f64,
    /// 수리소 레벨당 할인율 (%)
    pub discount_per_level: u32,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self { cost_per_hp: 50.0, destruction_multiplier: 2.0, discount_per_level: 5 }
    }
}

/// 레이팅(ELO) 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingParams {
    /// K-factor
    pub k_factor: f64,
}

impl Default for RatingParams {
    fn default() -> Self {
        Self { k_factor: 32.0 }
    }
}

/// 정산 경제 전체 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EconomyConfig {
    #[serde(default)]
    pub revenue: RevenueParams,
    #[serde(default)]
    pub rewards: RewardParams,
    #[serde(default)]
    pub repair: RepairParams,
    #[serde(default)]
    pub rating: RatingParams,
}

impl EconomyConfig {
    /// 라이브 서비스 기본값
    pub fn standard() -> Self {
        Self::default()
    }

    /// 레벨당 배율이 기본 배수 전체만큼 증가하는 구형 스케일.
    /// 초기 밸런스 시트가 쓰던 값으로, 운영 수치와는 다르다.
    pub fn flat_studio() -> Self {
        let mut cfg = Self::default();
        cfg.revenue.studio_rate = 1.0;
        cfg
    }

    /// 이벤트전: 보상 2배, 태그 프레스티지 상향
    pub fn showmatch() -> Self {
        let mut cfg = Self::default();
        cfg.rewards.win *= 2;
        cfg.rewards.loss *= 2;
        cfg.rewards.draw *= 2;
        cfg.rewards.tag_prestige_multiplier = 2.0;
        cfg
    }
}

// ========== Tests ==========
