//! 수리비 계산
//!
//! 받은 피해량에 비례한 수리비. 파괴된 로봇은 배율이 붙고, 스테이블의
//! 수리소 레벨만큼 할인된다. 할인은 100%를 넘지 않는다.

use super::config::{EconomyConfig, RepairParams};

#[derive(Debug, Clone)]
pub struct RepairCalculator {
    params: RepairParams,
}

impl RepairCalculator {
    pub fn new(params: RepairParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.repair.clone())
    }

    /// 수리소 레벨에 따른 할인율 (%).
    pub fn discount_percent(&self, repair_bay_level: u32) -> u32 {
        (repair_bay_level * self.params.discount_per_level).min(100)
    }

    /// 한 로봇의 수리비. HP가 0 이하로 끝났으면 파괴로 본다.
    pub fn repair_cost(&self, max_hp: f64, final_hp: f64, repair_bay_level: u32) -> i64 {
        let destroyed = final_hp <= 0.0;
        // 음수 HP는 0으로 취급한다. 선체가 전부 사라진 것 이상은 없다.
        let damage_taken = max_hp - final_hp.clamp(0.0, max_hp);

        let mut base_cost = damage_taken * self.params.cost_per_hp;
        if destroyed {
            base_cost *= self.params.destruction_multiplier;
        }

        let discount_multiplier = 1.0 - self.discount_percent(repair_bay_level) as f64 / 100.0;
        ((base_cost * discount_multiplier).round() as i64).max(0)
    }
}

impl Default for RepairCalculator {
    fn default() -> Self {
        Self::new(RepairParams::default())
    }
}
