//! This is a load generator library which fires randomized point
//! transfers against a remote points service in fixed-size *waves*.
//!
//! A wave launches exactly `unit` concurrent workers and blocks until
//! every one of them has resolved, which caps the number of in-flight
//! requests. Individual attempts are retried transparently up to a
//! ceiling; exhausting the ceiling aborts the whole run.
//!
//! Between waves, a [`Sampler`](sampler::Sampler) probes the service's
//! observable state and appends throughput and latency lines to an
//! append-only [`Report`](report::Report). Because sampling only ever
//! happens between waves, every probe observes a quiescent point with
//! all prior transfers committed.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod sampler;
pub mod sender;
pub mod wave;
pub mod workload;

pub use crate::config::Config;
pub use crate::driver::Driver;
pub use crate::error::{ClientError, FatalError};
pub use crate::wave::run_wave;
pub use crate::workload::{Transfer, Workload};
