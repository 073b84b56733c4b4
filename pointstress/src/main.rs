//! Bounded-concurrency load generator for the points service.
//!
//! Fires randomized point transfers in fixed-size waves, capping
//! in-flight requests per wave, retrying failed attempts
//! transparently, and sampling the service between cycles to record
//! throughput and latency in an append-only report file.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use pointstress::client::ServiceClient;
use pointstress::config::Config;
use pointstress::driver::Driver;
use pointstress::report::Report;

/// Load generator for the points transfer service
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    config: PathBuf,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Args = argh::from_env();
    let config_file = std::fs::File::open(&args.config).context("failed to open config file")?;
    let config: Config =
        serde_yaml::from_reader(config_file).context("failed to parse config YAML")?;
    config.validate().context("invalid configuration")?;

    let report = Report::open(&config.report).context("failed to open report file")?;
    let client = ServiceClient::new(&config.remote);

    Driver::new(config, client, report).run().await
}
