//! Periodic measurement probes, run strictly between waves.

use std::time::Instant;

use crate::client::ServiceClient;
use crate::error::Result;
use crate::report::Report;

/// Probes the service's observable state between measurement cycles.
///
/// A sample is two reads: a history probe whose result is discarded
/// (it only exercises the endpoint), then a wall-clock-timed state
/// probe whose raw answer lands in the report. Since the driver only
/// calls this between waves, every probe observes a quiescent point.
#[derive(Debug)]
pub struct Sampler {
    client: ServiceClient,
    participant: String,
}

impl Sampler {
    /// Creates a sampler probing the given participant.
    pub fn new(client: ServiceClient, participant: String) -> Self {
        Self {
            client,
            participant,
        }
    }

    /// Takes one measurement and appends it to the report.
    ///
    /// `count` is the cumulative number of completed transfers so
    /// far. Errors here are the caller's to log; they never abort the
    /// run. A probe that answers with an error status still produces
    /// a measurement line, recording the status and raw body as-is.
    pub async fn sample(&self, count: u64, report: &Report) -> Result<()> {
        self.client.fetch_history(&self.participant).await?;

        let start = Instant::now();
        let probe = self.client.fetch_state(&self.participant).await?;
        let elapsed = start.elapsed();

        report.measurement(count, probe.status.as_u16(), &probe.body, elapsed);
        Ok(())
    }
}
