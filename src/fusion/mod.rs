// src/fusion/mod.rs
//! Attaches secondary identifiers from external extracts to hierarchy nodes by name.

pub mod fuser;
pub mod index;
pub mod passes;
pub mod unmatched_log;

pub use fuser::{fuse_identifiers, match_rows, PassOutcome};
pub use passes::{FusionPass, SourceKind, ALL_PASSES};
