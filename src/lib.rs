//! tokensync - keep design tokens in sync with a variable store
//!
//! This crate provides the core functionality for the `tokensync` CLI tool:
//! records are read from a document database, transformed into typed design
//! tokens, and reconciled into named collections of a variable store.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`source`] - Document sources (HTTP API, JSON export)
//! - [`tokens`] - Record → token transformation and alias resolution
//! - [`model`] - Data types (Token, Entry, Record)
//! - [`storage`] - Variable store trait and SQLite implementation
//! - [`sync`] - Reconciliation passes and collection export
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod source;
pub mod storage;
pub mod sync;
pub mod tokens;

pub use error::{Error, Result};

/// Global CSV output flag (set when `--format csv`).
pub static CSV_OUTPUT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if CSV output is requested.
#[inline]
pub fn is_csv() -> bool {
    CSV_OUTPUT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Escape a value for CSV output (quoted when it holds a comma, quote or newline).
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
