//! Battle settlement: outcome resolution and counter accrual
//!
//! The two steps that turn a raw battle report into persistent state changes:
//!
//! - [`OutcomeResolver`] reads the report's final vitals and produces the
//!   authoritative verdict. Only the currently-fighting robot ever decides a
//!   team match.
//! - [`StatAccrual`] applies the per-robot counter increments and hands back
//!   an [`AccrualReceipt`] with the post-accrual figures the revenue step
//!   must read.
//!
//! Economy math itself (credits, fame amounts, rating deltas, payouts) lives
//! in [`crate::economy`]; settlement decides who gets them and in what order
//! state moves.

pub mod accrual;
pub mod resolver;

pub use accrual::{AccrualReceipt, BattleParticipation, StatAccrual};
pub use resolver::OutcomeResolver;
