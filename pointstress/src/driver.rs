//! Run orchestration: reset, provisioning, then load/measure cycles.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::ServiceClient;
use crate::config::Config;
use crate::report::Report;
use crate::sampler::Sampler;
use crate::wave::{self, WaveSpec};

/// Drives a full load-generation run against the remote service.
///
/// The run proceeds through reset, provisioning, and then `cycles`
/// measurement cycles of `waves_per_cycle` waves each. Setup failures
/// and retry exhaustion are fatal and propagate out; sampler failures
/// only log, and the run continues.
#[derive(Debug)]
pub struct Driver {
    config: Config,
    client: ServiceClient,
    report: Arc<Report>,
}

impl Driver {
    /// Creates a driver from its explicit collaborators.
    pub fn new(config: Config, client: ServiceClient, report: Report) -> Self {
        Self {
            config,
            client,
            report: Arc::new(report),
        }
    }

    /// Runs the whole load generation.
    ///
    /// The report is flushed before this returns, on both the success
    /// and the fatal path.
    pub async fn run(self) -> Result<()> {
        let outcome = self.run_inner().await;
        self.report.flush();
        outcome
    }

    async fn run_inner(&self) -> Result<()> {
        self.config.validate().context("invalid configuration")?;

        if let Err(err) = self.client.reset(&self.config.reset_token).await {
            self.report.line(format_args!("failed to reset: {err}"));
            return Err(err).context("failed to reset service state");
        }

        for name in &self.config.participants {
            if let Err(err) = self.client.create_participant(name).await {
                self.report
                    .line(format_args!("failed to prepare user {name}: {err}"));
                return Err(err).with_context(|| format!("failed to provision `{name}`"));
            }
        }
        tracing::info!(remote = %self.config.remote, "setup complete, generating load");

        let spec = WaveSpec {
            participants: self.config.participants.clone(),
            max_point: self.config.max_point,
            max_attempts: self.config.max_attempts,
        };
        let transport = Arc::new(self.client.clone());
        let sampler = Sampler::new(self.client.clone(), self.config.participants[0].clone());

        let mut total: u64 = 0;
        for cycle in 0..self.config.cycles {
            for _ in 0..self.config.waves_per_cycle {
                match wave::run_wave(&transport, &self.report, &spec, self.config.unit).await {
                    Ok(completed) => total += completed as u64,
                    Err(err) => {
                        self.report.line(format_args!("fatal: {err}"));
                        return Err(err).context("wave aborted, ending the run");
                    }
                }
            }

            if let Err(err) = sampler.sample(total, &self.report).await {
                tracing::warn!(cycle, error = %err, "failed to measure");
                self.report.line(format_args!("failed to measure: {err}"));
            }
        }

        tracing::info!(total, "run complete");
        Ok(())
    }
}
