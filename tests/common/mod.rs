//! Common test utilities and fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: upstream fixture loaders and wiremock mounting helpers
//! - `logger`: phase-tracking test logger
//! - `log_capture`: tracing capture layer for asserting on emitted logs

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod logger;
