//! Levipack library exports for testing.
//!
//! The binary in `main.rs` is a thin CLI wrapper; everything it does goes
//! through these modules so integration tests can drive the same code.

pub mod common;
pub mod config;
pub mod preflight;
pub mod privilege;
pub mod process;
pub mod rootfs;
