//! Governance payload test harness for lending pools.
//!
//! Snapshots every reserve of a pool before and after a payload executes, diffs the two
//! snapshots, enforces a fixed set of plausibility rules and drives end-to-end scenarios
//! (supply, withdraw, borrow, repay, liquidate, flash loan) against every eligible reserve.

pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod diff;
pub mod errors;
pub mod oracle;
pub mod payload;
pub mod plausibility;
pub mod pool;
pub mod report;
pub mod reserve;
pub mod scenario;
pub mod snapshot;
pub mod strategy;

pub use crate::checkpoint::{with_rollback, Rollback};
pub use crate::config::HarnessConfig;
pub use crate::errors::{HarnessError, PoolError};
pub use crate::payload::{default_test, execute_payload, Payload};
pub use crate::pool::{Checkpoint, FlashLoanMode, PoolDriver, PoolView, TokenView};
pub use crate::reserve::ReserveConfig;
pub use crate::scenario::E2eDriver;
pub use crate::snapshot::{create_snapshot, Snapshot};
