// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # cortex-observability
//!
//! Logging infrastructure shared by the Cortex trainer crates.
//!
//! Provides console output in text or JSON, optional rotated file output and
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: File-based log rotation in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Crate names accepted by the debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "cortex-agent",
    "cortex-config",
    "cortex-observability",
    "cortex-train",
];
