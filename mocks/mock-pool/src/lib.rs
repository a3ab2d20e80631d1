mod actions;
mod mock_pool;
mod positions;
mod storage;
pub mod testutils;

pub use crate::mock_pool::{MockPool, CALL_COST, DEFAULT_FLASH_LOAN_PREMIUM, WRITE_COST};
pub use crate::storage::{MockEModeCategory, MockReserve, MockStrategy};
