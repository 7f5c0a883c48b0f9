//! Shared utilities for the provisioning tools
//!
//! This crate provides common functionality used by the workspace binaries:
//! - Structured logging initialization
//! - Environment lookup behind a swappable source

pub mod env;
pub mod logging;

pub use env::{EnvSource, EnvSourceExt, ProcessEnv};
pub use logging::init_logging;
