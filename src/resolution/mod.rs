// src/resolution/mod.rs
pub mod engine;
pub mod trigram;

pub use engine::{resolve, MatchStatus, RankedResult, Resolution};
