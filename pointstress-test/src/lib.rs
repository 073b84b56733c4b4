//! Test utilities for the pointstress load generator.
//!
//! This crate provides an in-process stub of the points service with
//! failure-injection knobs, plus a test logger. See the modules for
//! all available utilities.

pub mod server;
pub mod tracing;
