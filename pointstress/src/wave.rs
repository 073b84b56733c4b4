//! Wave scheduling: fixed-size worker populations behind a channel
//! barrier.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::Transport;
use crate::error::FatalError;
use crate::report::Report;
use crate::sender;
use crate::workload::Workload;

/// Everything a wave worker needs to draw and send transfers.
#[derive(Debug, Clone)]
pub struct WaveSpec {
    /// The two participants between which transfers flow.
    pub participants: [String; 2],
    /// Transfer payloads are drawn uniformly from `0..max_point`.
    pub max_point: i64,
    /// Attempts per transfer before the run aborts.
    pub max_attempts: usize,
}

/// Launches `unit` concurrent workers and blocks until all of them
/// have resolved, returning the number of completions drained.
///
/// The completion channel has capacity `unit`, so it is both the
/// fan-in queue and the barrier: the wave is over exactly when `unit`
/// tokens have been drained. Workers push `Ok` on success, or their
/// fatal error once retries are exhausted; each worker pushes exactly
/// one token, so the drain always terminates. With one slot reserved
/// per worker, the push never blocks in normal operation. A worker
/// that dies without its token fails the wave with
/// [`FatalError::WorkerLost`]; a partial count is never returned as
/// success.
///
/// No worker identity is tracked, only the aggregate count. Waves are
/// strictly sequential: a caller cannot start the next wave before
/// this returns, and by then every in-flight request has settled.
pub async fn run_wave<T: Transport>(
    transport: &Arc<T>,
    report: &Arc<Report>,
    spec: &WaveSpec,
    unit: usize,
) -> Result<usize, FatalError> {
    // A zero-sized wave has nobody to wait for. This also sidesteps
    // the zero-capacity channel, which tokio rejects.
    if unit == 0 {
        return Ok(0);
    }

    let (completions, mut drain) = mpsc::channel::<Result<(), FatalError>>(unit);

    for _ in 0..unit {
        let transport = Arc::clone(transport);
        let report = Arc::clone(report);
        let completions = completions.clone();
        let mut workload = Workload::new(spec.participants.clone(), spec.max_point);
        let max_attempts = spec.max_attempts;

        tokio::spawn(async move {
            let outcome = sender::send(&*transport, &mut workload, max_attempts, &report).await;
            // A dropped receiver means the run is already aborting.
            let _ = completions.send(outcome).await;
        });
    }
    drop(completions);

    let mut drained = 0;
    let mut fatal = None;
    while drained < unit {
        match drain.recv().await {
            Some(Ok(())) => drained += 1,
            Some(Err(err)) => {
                drained += 1;
                if fatal.is_none() {
                    fatal = Some(err);
                }
            }
            // All senders gone with tokens still missing: a worker
            // died without reporting, e.g. by panicking. The wave
            // count cannot be trusted, so this is never a success.
            None => {
                if fatal.is_none() {
                    fatal = Some(FatalError::WorkerLost);
                }
                break;
            }
        }
    }

    match fatal {
        None => Ok(drained),
        Some(err) => Err(err),
    }
}
