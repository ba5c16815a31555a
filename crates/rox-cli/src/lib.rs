//! rox-cli library root.
//!
//! Exposes the config, persistence and sweep modules so integration tests
//! can drive them without going through the binary.

pub mod config;
pub mod persistence;
pub mod secrets;
pub mod sweep;
