// src/models/mod.rs
pub mod geo;
pub mod stats_models;

pub use geo::{Ancestor, GeoNode, IdentifierHit, IdentifierRecord, NodeId, NodeLevel, SchemeTag};
pub use stats_models::{BuildReport, FailedPass, FuseReport, PipelineStats};
