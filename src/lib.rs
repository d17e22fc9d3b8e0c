//! AWS OTel Collector Library
//!
//! Configuration resolution, log output and the service boundary of the
//! collector, exported for the binary and for integration tests.

pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
