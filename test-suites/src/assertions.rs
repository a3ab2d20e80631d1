use harness::{HarnessError, PoolError};

pub fn assert_approx_eq_abs(a: i128, b: i128, delta: i128) {
    assert!(
        a >= b - delta && a <= b + delta,
        "assertion failed: `(left != right)` \
         (left: `{:?}`, right: `{:?}`, epsilon: `{:?}`)",
        a,
        b,
        delta
    );
}

/// Assert a harness result failed with `expected`, printing its string code otherwise
pub fn assert_harness_error<T: core::fmt::Debug>(
    result: Result<T, HarnessError>,
    expected: HarnessError,
) {
    match result {
        Err(err) => assert_eq!(
            err, expected,
            "expected {} but failed with {}",
            expected.code(),
            err.code()
        ),
        Ok(value) => panic!("expected {} but succeeded with {:?}", expected.code(), value),
    }
}

pub fn assert_pool_error<T: core::fmt::Debug>(result: Result<T, PoolError>, expected: PoolError) {
    match result {
        Err(err) => assert_eq!(err, expected),
        Ok(value) => panic!("expected {:?} but succeeded with {:?}", expected, value),
    }
}
