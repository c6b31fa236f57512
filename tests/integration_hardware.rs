//! Hardware integration test suite.
//!
//! These tests require an actual serial port and are ignored by default.
//! Run with: cargo test --features hardware-tests --test integration_hardware -- --ignored

#![cfg(all(unix, feature = "hardware-tests"))]

#[path = "common/mod.rs"]
mod common;

#[path = "hardware/mod.rs"]
mod hardware;

pub use hardware::*;
