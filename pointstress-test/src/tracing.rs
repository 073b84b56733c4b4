use tracing_subscriber::EnvFilter;

/// Initialize the logger for testing.
///
/// This logs to the stdout registered by the Rust test runner, and
/// only captures logs from the pointstress crates themselves.
///
/// # Example
///
/// ```
/// pointstress_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::new("ERROR,pointstress=TRACE,pointstress_test=TRACE");

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
