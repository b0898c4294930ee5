//! Screener Common - shared configuration, error types and logging.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and CLI exit codes
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, DataConfig, ObservabilityConfig, ScreenerDefaults};
pub use error::{Error, Result};
