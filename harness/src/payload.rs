use log::{error, info};

use crate::{
    config::HarnessConfig,
    constants::PAYLOAD_RESOURCE_LIMIT_PCT,
    diff::{diff_snapshots, SnapshotDiff},
    errors::{HarnessError, PoolError},
    plausibility::validate_plausibility,
    pool::{PoolDriver, StorageWrite},
    report::{write_diff_report, write_snapshot_report, write_state_diff},
    scenario::E2eDriver,
    snapshot::{create_snapshot, Snapshot},
};

/// A governance payload that changes the configuration of a pool
pub trait Payload<P: PoolDriver> {
    /// Apply the payload to `pool`
    fn execute(&self, pool: &mut P) -> Result<(), PoolError>;
}

impl<P, F> Payload<P> for F
where
    P: PoolDriver,
    F: Fn(&mut P) -> Result<(), PoolError>,
{
    fn execute(&self, pool: &mut P) -> Result<(), PoolError> {
        self(pool)
    }
}

/// Everything produced by `default_test`
#[derive(Clone, Debug)]
pub struct PayloadReport {
    pub before: Snapshot,
    pub after: Snapshot,
    pub diff: SnapshotDiff,
    pub state_diff: Vec<StorageWrite>,
    pub resources_used: u64,
}

/// The outcome of a single payload execution
#[derive(Clone, Debug)]
pub struct PayloadExecution {
    pub state_diff: Vec<StorageWrite>,
    pub resources_used: u64,
}

/// Execute `payload` against the pool while recording the storage it writes
///
/// ### Arguments
/// * `pool` - The pool the payload is applied to
/// * `payload` - The payload to execute
/// * `config` - The harness configuration
///
/// ### Errors
/// If the payload fails, or uses more than 95% of the block resource limit
pub fn execute_payload<P, L>(
    pool: &mut P,
    payload: &L,
    config: &HarnessConfig,
) -> Result<PayloadExecution, HarnessError>
where
    P: PoolDriver,
    L: Payload<P> + ?Sized,
{
    pool.start_state_diff();
    let resources_before = pool.resources_used();
    let result = payload.execute(pool);
    let resources_used = pool.resources_used().saturating_sub(resources_before);
    let state_diff = pool.take_state_diff();

    if let Err(err) = result {
        error!("payload execution failed: {}", err);
        return Err(HarnessError::PayloadFailed);
    }
    if exceeds_resource_limit(resources_used, config.block_resource_limit) {
        error!(
            "payload used {} resources, over {}% of the block limit {}",
            resources_used, PAYLOAD_RESOURCE_LIMIT_PCT, config.block_resource_limit
        );
        return Err(HarnessError::PayloadResourceLimitExceeded);
    }
    info!(
        "payload used {} of {} resources, {} storage writes",
        resources_used,
        config.block_resource_limit,
        state_diff.len()
    );
    Ok(PayloadExecution {
        state_diff,
        resources_used,
    })
}

/// Run the standard checks around a payload
///
/// Snapshots the pool as `<name>_before`, executes the payload, snapshots the pool as
/// `<name>_after`, writes the reports, validates the plausibility rules and, if enabled,
/// runs the end-to-end scenarios against the resulting configuration.
///
/// ### Arguments
/// * `pool` - The pool the payload is applied to
/// * `name` - The name reports are written under
/// * `payload` - The payload to execute
/// * `config` - The harness configuration
///
/// ### Errors
/// The first failure of any stage
pub fn default_test<P, L>(
    pool: &mut P,
    name: &str,
    payload: &L,
    config: &HarnessConfig,
) -> Result<PayloadReport, HarnessError>
where
    P: PoolDriver,
    L: Payload<P> + ?Sized,
{
    let before = create_snapshot(&*pool, &format!("{}_before", name), config)?;
    let execution = execute_payload(pool, payload, config)?;
    let after = create_snapshot(&*pool, &format!("{}_after", name), config)?;
    let diff = diff_snapshots(&before, &after);

    if config.write_reports {
        write_snapshot_report(&config.reports_dir, &before)?;
        write_snapshot_report(&config.reports_dir, &after)?;
        write_diff_report(&config.reports_dir, &diff)?;
        write_state_diff(&config.reports_dir, name, &execution.state_diff)?;
    }

    validate_plausibility(&*pool, &before.reserves, &after.reserves, config)?;

    if config.run_e2e {
        E2eDriver::new(config).run(pool, &after.reserves)?;
    }

    Ok(PayloadReport {
        before,
        after,
        diff,
        state_diff: execution.state_diff,
        resources_used: execution.resources_used,
    })
}

fn exceeds_resource_limit(used: u64, limit: u64) -> bool {
    cast::u128(used) * 100 > cast::u128(limit) * cast::u128(PAYLOAD_RESOURCE_LIMIT_PCT)
}
