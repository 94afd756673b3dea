// src/store/mod.rs
//! Storage capability consumed by the build pipeline and the resolver.
//!
//! The handle is passed explicitly into every operation; implementations own
//! their connection handling (pooling for Postgres, a lock for the in-memory store).

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Ancestor, GeoNode, IdentifierHit, IdentifierRecord, NodeId, NodeLevel, SchemeTag};

pub use memory::InMemoryStore;
pub use postgres::PgGeoStore;

/// A similarity-phase candidate with its trigram distance in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub hit: IdentifierHit,
    pub distance: f64,
}

#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Creates tables, extensions and indexes if they are missing.
    async fn ensure_schema(&self) -> Result<()>;

    async fn node_count(&self) -> Result<usize>;

    /// Writes a whole hierarchy atomically. Nodes arrive parents first.
    async fn insert_hierarchy(&self, nodes: &[GeoNode]) -> Result<usize>;

    /// All nodes of one level, ordered by id.
    async fn nodes_at_level(&self, level: NodeLevel) -> Result<Vec<GeoNode>>;

    /// Number of stored identifier records belonging to any of `schemes`.
    async fn identifier_count(&self, schemes: &[SchemeTag]) -> Result<usize>;

    /// Writes one pass worth of records atomically.
    async fn insert_identifiers(&self, records: &[IdentifierRecord]) -> Result<usize>;

    /// Records whose value equals one of `values`, by priority desc then record id.
    async fn exact_lookup(
        &self,
        values: &[String],
        filter: Option<SchemeTag>,
    ) -> Result<Vec<IdentifierHit>>;

    /// The `limit` closest records by distance asc, priority desc, record id asc.
    ///
    /// Distance is the smaller of the trigram distance to the code value and
    /// to the owning node's name.
    async fn similarity_lookup(
        &self,
        query: &str,
        filter: Option<SchemeTag>,
        limit: usize,
    ) -> Result<Vec<ScoredHit>>;

    /// Strict ancestors of the node at `path`, root first.
    async fn ancestors(&self, path: &[NodeId]) -> Result<Vec<Ancestor>>;
}
