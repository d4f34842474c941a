//! 전투 후 경제 계산
//!
//! 정산 파이프라인이 쓰는 순수 계산기 모음. 전부 상태가 없고, 입력은
//! 항상 누적이 끝난 수치다.
//!
//! ## 구성 요소
//!
//! - [`RevenueCalculator`]: 스트리밍 수익 공식 (base x 전투 x 명성 x 스튜디오)
//! - [`TeamRevenueAggregator`]: 태그팀 수익, 팀 내 최대값 기반
//! - [`RewardCalculator`]: 크레딧, 리그 포인트, 명성, 위신
//! - [`RepairCalculator`]: 수리비와 수리소 할인
//! - [`RatingCalculator`]: ELO 변동
//!
//! 모든 튜닝 값은 [`EconomyConfig`]에 모여 있다.

pub mod config;
pub mod rating;
pub mod repair;
pub mod revenue;
pub mod rewards;
pub mod team_revenue;

pub use config::{EconomyConfig, RatingParams, RepairParams, RevenueParams, RewardParams};
pub use rating::{RatingCalculator, BYE_ROBOT_RATING};
pub use repair::RepairCalculator;
pub use revenue::RevenueCalculator;
pub use rewards::RewardCalculator;
pub use team_revenue::{RobotCounters, TeamRevenueAggregator};
