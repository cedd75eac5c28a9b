//! Core types and trait definitions for the Licita tender aggregator.
//!
//! This crate is deliberately free of HTTP and file-format dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod cell;
pub mod columns;
pub mod error;
pub mod fetch;
pub mod source;
pub mod table;
pub mod watch;

pub use error::{Error, Result};
