pub mod assertions;
pub mod payloads;
pub mod test_fixture;

/// Route harness logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
