//! 사이클별 감사 시퀀스 번호
//!
//! 감사 이벤트는 사이클 안에서 단조 증가하는 시퀀스 번호를 받는다. 발급기는
//! 사이클별 다음 번호를 캐시에 들고 있다가 하나씩 내어 주고, 사이클이 닫히면
//! [`CycleSequencer::reset_cycle`]로 그 사이클의 카운터를 비운다.

use crate::error::{Result, SettlementError};
use fxhash::FxHashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct CycleSequencer {
    next: Mutex<FxHashMap<u32, u64>>,
}

impl CycleSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 시퀀스 번호를 발급한다. 사이클마다 1부터 시작.
    pub fn next_sequence(&self, cycle_number: u32) -> Result<u64> {
        let mut next = self
            .next
            .lock()
            .map_err(|_| SettlementError::Persistence("sequencer lock poisoned".into()))?;
        let slot = next.entry(cycle_number).or_insert(1);
        let issued = *slot;
        *slot += 1;
        Ok(issued)
    }

    /// 끝난 사이클의 카운터를 정리한다.
    pub fn reset_cycle(&self, cycle_number: u32) -> Result<()> {
        let mut next = self
            .next
            .lock()
            .map_err(|_| SettlementError::Persistence("sequencer lock poisoned".into()))?;
        next.remove(&cycle_number);
        Ok(())
    }
}
