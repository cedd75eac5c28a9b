//! Schema-unification pipeline for Licita.
//!
//! Turns each portal's raw table into the canonical schema and stitches the
//! results into one dataset:
//!
//! ```text
//! RawTable ─ mapper::rename_map ─┐
//!                                ├─ Normalizer::normalize ─ unify ─ [merge_by_key]
//! ColumnConfig ──────────────────┘
//! ```
//!
//! Also home to the snapshot format ([`tsv`]) and favorite selection
//! ([`select`]).

pub mod error;
pub mod mapper;
pub mod normalize;
pub mod select;
pub mod tsv;
pub mod unify;

pub use error::{Error, Result};
pub use mapper::{RenameMap, rename_map};
pub use normalize::Normalizer;
pub use unify::{MergeOptions, merge_by_key, unify};
