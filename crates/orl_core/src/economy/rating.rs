//! ELO 레이팅 변동
//!
//! 표준 ELO 공식. 태그팀전은 두 로봇의 합산 레이팅으로 팀 대 팀 변동을
//! 구한 뒤 같은 값을 두 로봇 모두에게 적용한다.
//!
//! 부전승 상대는 로봇당 [`BYE_ROBOT_RATING`]으로 친다. 부전승이라도 실제
//! 출전 팀의 레이팅은 정상적으로 움직인다.

use super::config::{EconomyConfig, RatingParams};
use crate::models::FightResult;

/// 부전승 상대의 로봇당 레이팅. 팀이면 두 배로 합산한다.
pub const BYE_ROBOT_RATING: i32 = 1000;

#[derive(Debug, Clone)]
pub struct RatingCalculator {
    params: RatingParams,
}

impl RatingCalculator {
    pub fn new(params: RatingParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.rating.clone())
    }

    /// 기대 승률.
    fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
        1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0))
    }

    /// 양쪽의 레이팅 변동 (A 변동, B 변동).
    ///
    /// `result_for_a`는 A측 기준 결과. 무승부는 양측 모두 0.5점 취급.
    pub fn rating_changes(
        &self,
        rating_a: i32,
        rating_b: i32,
        result_for_a: FightResult,
    ) -> (i32, i32) {
        let expected_a = Self::expected_score(rating_a, rating_b);
        let expected_b = Self::expected_score(rating_b, rating_a);

        let (actual_a, actual_b) = match result_for_a {
            FightResult::Win => (1.0, 0.0),
            FightResult::Loss => (0.0, 1.0),
            FightResult::Draw => (0.5, 0.5),
        };

        let change_a = (self.params.k_factor * (actual_a - expected_a)).round() as i32;
        let change_b = (self.params.k_factor * (actual_b - expected_b)).round() as i32;
        (change_a, change_b)
    }
}

impl Default for RatingCalculator {
    fn default() -> Self {
        Self::new(RatingParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratings_split_k() {
        let calc = RatingCalculator::default();
        assert_eq!(calc.rating_changes(1000, 1000, FightResult::Win), (16, -16));
        assert_eq!(calc.rating_changes(1000, 1000, FightResult::Draw), (0, 0));
    }

    #[test]
    fn test_underdog_gains_more() {
        let calc = RatingCalculator::default();
        // 1000 대 1200: 약자가 이기면 크게 얻는다
        let (a, b) = calc.rating_changes(1000, 1200, FightResult::Win);
        assert_eq!((a, b), (24, -24));
        // 약자가 비겨도 레이팅을 얻는다
        let (a, b) = calc.rating_changes(1000, 1200, FightResult::Draw);
        assert_eq!((a, b), (8, -8));
    }

    #[test]
    fn test_favorite_gains_little() {
        let calc = RatingCalculator::default();
        let (a, b) = calc.rating_changes(1200, 1000, FightResult::Win);
        assert_eq!((a, b), (8, -8));
    }

    #[test]
    fn test_team_vs_bye_rating() {
        let calc = RatingCalculator::default();
        // 합산 2100 팀이 부전승 팀(2000)을 이기는 경우
        let (real, _) = calc.rating_changes(2100, 2 * BYE_ROBOT_RATING, FightResult::Win);
        assert_eq!(real, 12);
    }
}
