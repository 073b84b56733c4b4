//! Run configuration, loaded from a YAML file.

use std::path::PathBuf;

use anyhow::ensure;
use serde::Deserialize;

/// Full configuration for one load-generation run.
///
/// All batching parameters have defaults matching the standard run
/// profile; only the remote URL and the participants are required.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the points service.
    pub remote: String,

    /// Path of the append-only report file.
    #[serde(default = "default_report")]
    pub report: PathBuf,

    /// The two participants between which transfers flow, fixed for
    /// the lifetime of the run.
    pub participants: [String; 2],

    /// Token required by the destructive reset endpoint.
    #[serde(default = "default_reset_token")]
    pub reset_token: String,

    /// Workers per wave; also the hard in-flight request ceiling.
    #[serde(default = "default_unit")]
    pub unit: usize,

    /// Waves per measurement cycle.
    #[serde(default = "default_waves_per_cycle")]
    pub waves_per_cycle: usize,

    /// Measurement cycles in the whole run.
    #[serde(default = "default_cycles")]
    pub cycles: usize,

    /// Attempts per transfer before the run aborts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Transfer payloads are drawn uniformly from `0..max_point`.
    #[serde(default = "default_max_point")]
    pub max_point: i64,
}

impl Config {
    /// Rejects parameter values that cannot drive a run.
    ///
    /// Payload draws need a non-empty `0..max_point` range, and the
    /// retry ceiling must allow at least one attempt.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_point >= 1, "max_point must be at least 1");
        ensure!(self.max_attempts >= 1, "max_attempts must be at least 1");
        Ok(())
    }
}

fn default_report() -> PathBuf {
    "pointstress.log".into()
}

fn default_reset_token() -> String {
    "Reset-Force".to_owned()
}

fn default_unit() -> usize {
    100
}

fn default_waves_per_cycle() -> usize {
    100
}

fn default_cycles() -> usize {
    100
}

fn default_max_attempts() -> usize {
    10
}

fn default_max_point() -> i64 {
    1_000_000
}
