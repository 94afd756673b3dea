// src/lib.rs
pub mod error;
pub mod fusion;
pub mod hierarchy;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod resolution;
pub mod sources;
pub mod store;
pub mod utils;

pub use error::{BuildError, FusionError, NotFoundReason, ResolveError};
pub use resolution::{resolve, Resolution};
pub use store::{GeoStore, InMemoryStore, PgGeoStore};
