use core::ops::{Deref, DerefMut};

use crate::{errors::HarnessError, pool::PoolDriver};

/// A checkpoint of the pool that is restored when the guard is dropped
///
/// The guard derefs to the pool, so everything done through it is undone on exit, including
/// when the scope is left early through `?` or a panic.
pub struct Rollback<'a, P: PoolDriver> {
    pool: &'a mut P,
    checkpoint: Option<crate::pool::Checkpoint>,
}

impl<'a, P: PoolDriver> Rollback<'a, P> {
    /// Take a checkpoint of `pool`
    pub fn new(pool: &'a mut P) -> Self {
        let checkpoint = pool.checkpoint();
        Rollback {
            pool,
            checkpoint: Some(checkpoint),
        }
    }
}

impl<P: PoolDriver> Deref for Rollback<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.pool
    }
}

impl<P: PoolDriver> DerefMut for Rollback<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.pool
    }
}

impl<P: PoolDriver> Drop for Rollback<'_, P> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            self.pool.restore(checkpoint);
        }
    }
}

/// Run `f` against the pool and restore the pool to its prior state afterwards, whatever the
/// outcome
///
/// ### Arguments
/// * `pool` - The pool to checkpoint
/// * `f` - The sub-scenario to run
pub fn with_rollback<P, T, F>(pool: &mut P, f: F) -> Result<T, HarnessError>
where
    P: PoolDriver,
    F: FnOnce(&mut P) -> Result<T, HarnessError>,
{
    let mut guard = Rollback::new(pool);
    f(&mut *guard)
}
