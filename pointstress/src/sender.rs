//! Transparent retries around single transfer attempts.

use crate::client::Transport;
use crate::error::FatalError;
use crate::report::Report;
use crate::workload::Workload;

/// Sends one transfer, retrying up to `max_attempts` times.
///
/// Every attempt draws a fresh randomized transfer from the workload;
/// nothing is reused across attempts, and there is no backoff between
/// them. The first attempt always runs, so a ceiling of zero behaves
/// as one ([`Config::validate`](crate::Config::validate) rejects it
/// anyway). The first success wins. Exhausting the ceiling returns
/// [`FatalError::RetriesExhausted`], which ends the entire run: a
/// request that cannot get through in `max_attempts` immediate tries
/// points at the service, not at the request.
pub async fn send<T: Transport + ?Sized>(
    transport: &T,
    workload: &mut Workload,
    max_attempts: usize,
    report: &Report,
) -> Result<(), FatalError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let transfer = workload.next_transfer();
        match transport.send_once(&transfer).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(attempt, error = %err, "transfer attempt failed, retrying");
                report.line(format_args!("failed to send request: {err}"));
            }
            Err(err) => {
                report.line(format_args!(
                    "failed to send request after {attempt} attempts: {err}"
                ));
                return Err(FatalError::RetriesExhausted {
                    attempts: attempt,
                    last: err,
                });
            }
        }
    }
}
