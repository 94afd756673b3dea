// src/store/postgres.rs - pg_trgm / ltree backed implementation of GeoStore
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use tokio_postgres::Row as PgRow;

use crate::models::geo::{path_from_label, path_to_label};
use crate::models::{Ancestor, GeoNode, IdentifierHit, IdentifierRecord, NodeId, NodeLevel, SchemeTag};
use crate::store::{GeoStore, ScoredHit};
use crate::utils::db_connect::PgPool;

const SCHEMA_SQL: &str = "
    CREATE EXTENSION IF NOT EXISTS pg_trgm;
    CREATE EXTENSION IF NOT EXISTS ltree;

    CREATE TABLE IF NOT EXISTS public.geo_node (
        id BIGINT PRIMARY KEY,
        parent_id BIGINT REFERENCES public.geo_node(id) ON DELETE CASCADE,
        level VARCHAR(20) NOT NULL,
        name VARCHAR(255) NOT NULL,
        path ltree NOT NULL
    );

    CREATE TABLE IF NOT EXISTS public.identifier (
        id BIGSERIAL PRIMARY KEY,
        node_id BIGINT NOT NULL REFERENCES public.geo_node(id) ON DELETE CASCADE,
        value VARCHAR(50) NOT NULL,
        scheme VARCHAR(20) NOT NULL,
        priority INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_identifier_value_btree ON public.identifier (value);
    CREATE INDEX IF NOT EXISTS idx_identifier_value_trgm ON public.identifier USING GIN (value gin_trgm_ops);
    CREATE INDEX IF NOT EXISTS idx_identifier_scheme ON public.identifier (scheme);
    CREATE INDEX IF NOT EXISTS idx_geo_node_path_gist ON public.geo_node USING GIST (path);
    CREATE INDEX IF NOT EXISTS idx_geo_node_name_trgm ON public.geo_node USING GIN (name gin_trgm_ops);
";

const INSERT_NODE_SQL: &str = "
    INSERT INTO public.geo_node (id, parent_id, level, name, path)
    VALUES ($1, $2, $3, $4, $5::text::ltree)";

const INSERT_IDENTIFIER_SQL: &str = "
    INSERT INTO public.identifier (node_id, value, scheme, priority)
    VALUES ($1, $2, $3, $4)";

const HIT_COLUMNS: &str = "i.id AS record_id, gn.name AS node_name, gn.level AS node_level,
    gn.path::text AS node_path, i.value, i.scheme, i.priority";

/// `GeoStore` over a bb8 pool. Each call checks out its own connection.
#[derive(Clone)]
pub struct PgGeoStore {
    pool: PgPool,
}

impl PgGeoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn node_from_row(row: &PgRow) -> Result<GeoNode> {
    let level: String = row.get("level");
    let path: String = row.get("path");
    Ok(GeoNode {
        id: NodeId(row.get("id")),
        name: row.get("name"),
        level: level.parse()?,
        parent_id: row.get::<_, Option<i64>>("parent_id").map(NodeId),
        path: path_from_label(&path)?,
    })
}

fn hit_from_row(row: &PgRow) -> Result<IdentifierHit> {
    let level: String = row.get("node_level");
    let scheme: String = row.get("scheme");
    let path: String = row.get("node_path");
    Ok(IdentifierHit {
        record_id: row.get("record_id"),
        node_name: row.get("node_name"),
        node_level: level.parse()?,
        node_path: path_from_label(&path)?,
        value: row.get("value"),
        scheme: scheme.parse()?,
        priority: row.get("priority"),
    })
}

#[async_trait]
impl GeoStore for PgGeoStore {
    async fn ensure_schema(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for ensure_schema")?;
        conn.batch_execute(SCHEMA_SQL)
            .await
            .context("Failed to create geo_node/identifier schema")?;
        info!("Database schema is in place (pg_trgm, ltree, geo_node, identifier)");
        Ok(())
    }

    async fn node_count(&self) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for node_count")?;
        let row = conn
            .query_one("SELECT COUNT(*) FROM public.geo_node", &[])
            .await
            .context("Failed to count geo_node rows")?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    async fn insert_hierarchy(&self, nodes: &[GeoNode]) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for insert_hierarchy")?;
        let transaction = conn
            .transaction()
            .await
            .context("Failed to start transaction for hierarchy insert")?;
        let statement = transaction
            .prepare(INSERT_NODE_SQL)
            .await
            .context("Failed to prepare geo_node insert")?;

        for node in nodes {
            let parent_id = node.parent_id.map(|p| p.0);
            let path = path_to_label(&node.path);
            transaction
                .execute(
                    &statement,
                    &[&node.id.0, &parent_id, &node.level.as_str(), &node.name, &path],
                )
                .await
                .with_context(|| format!("Failed to insert geo_node {} ({})", node.id, node.name))?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit hierarchy insert")?;
        debug!("Inserted {} geo_node rows", nodes.len());
        Ok(nodes.len())
    }

    async fn nodes_at_level(&self, level: NodeLevel) -> Result<Vec<GeoNode>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for nodes_at_level")?;
        let rows = conn
            .query(
                "SELECT id, parent_id, level, name, path::text AS path
                 FROM public.geo_node WHERE level = $1 ORDER BY id",
                &[&level.as_str()],
            )
            .await
            .with_context(|| format!("Failed to load {} nodes", level))?;
        rows.iter().map(node_from_row).collect()
    }

    async fn identifier_count(&self, schemes: &[SchemeTag]) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for identifier_count")?;
        let scheme_names: Vec<String> = schemes.iter().map(|s| s.as_str().to_string()).collect();
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM public.identifier WHERE scheme = ANY($1)",
                &[&scheme_names],
            )
            .await
            .context("Failed to count identifier rows")?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    async fn insert_identifiers(&self, records: &[IdentifierRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for insert_identifiers")?;
        let transaction = conn
            .transaction()
            .await
            .context("Failed to start transaction for identifier insert")?;
        let statement = transaction
            .prepare(INSERT_IDENTIFIER_SQL)
            .await
            .context("Failed to prepare identifier insert")?;

        for record in records {
            transaction
                .execute(
                    &statement,
                    &[&record.node_id.0, &record.value, &record.scheme.as_str(), &record.priority],
                )
                .await
                .with_context(|| {
                    format!("Failed to insert {} identifier {}", record.scheme, record.value)
                })?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit identifier insert")?;
        Ok(records.len())
    }

    async fn exact_lookup(
        &self,
        values: &[String],
        filter: Option<SchemeTag>,
    ) -> Result<Vec<IdentifierHit>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for exact_lookup")?;
        let sql = format!(
            "SELECT {}
             FROM public.identifier i
             JOIN public.geo_node gn ON i.node_id = gn.id
             WHERE i.value = ANY($1)
               AND ($2::text IS NULL OR i.scheme = $2)
             ORDER BY i.priority DESC, i.id ASC",
            HIT_COLUMNS
        );
        let filter_name = filter.map(|s| s.as_str().to_string());
        let rows = conn
            .query(sql.as_str(), &[&values, &filter_name])
            .await
            .context("Exact identifier lookup failed")?;
        rows.iter().map(hit_from_row).collect()
    }

    /// Ranks every identifier row (optionally one scheme). Ordering by
    /// `LEAST(..)` over two columns cannot use the GIN trigram indexes, so this
    /// is a scan and sort of the filtered rows; fine for the ~7k municipalities
    /// and their codes, not for a large table.
    async fn similarity_lookup(
        &self,
        query: &str,
        filter: Option<SchemeTag>,
        limit: usize,
    ) -> Result<Vec<ScoredHit>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for similarity_lookup")?;
        let sql = format!(
            "SELECT {},
                    LEAST(i.value <-> $1::text, gn.name <-> $1::text)::float8 AS distance
             FROM public.identifier i
             JOIN public.geo_node gn ON i.node_id = gn.id
             WHERE ($2::text IS NULL OR i.scheme = $2)
             ORDER BY distance ASC, i.priority DESC, i.id ASC
             LIMIT $3",
            HIT_COLUMNS
        );
        let filter_name = filter.map(|s| s.as_str().to_string());
        let limit = limit as i64;
        let rows = conn
            .query(sql.as_str(), &[&query, &filter_name, &limit])
            .await
            .context("Similarity identifier lookup failed")?;
        rows.iter()
            .map(|row| {
                Ok(ScoredHit {
                    hit: hit_from_row(row)?,
                    distance: row.get("distance"),
                })
            })
            .collect()
    }

    async fn ancestors(&self, path: &[NodeId]) -> Result<Vec<Ancestor>> {
        if path.len() < 2 {
            return Ok(Vec::new());
        }
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for ancestors")?;
        let label = path_to_label(path);
        let rows = conn
            .query(
                "SELECT name, level FROM public.geo_node
                 WHERE path @> $1::text::ltree AND path <> $1::text::ltree
                 ORDER BY nlevel(path) ASC",
                &[&label],
            )
            .await
            .with_context(|| format!("Failed to load ancestors of path {}", label))?;
        rows.iter()
            .map(|row| {
                let level: String = row.get("level");
                Ok(Ancestor {
                    name: row.get("name"),
                    level: level.parse()?,
                })
            })
            .collect()
    }
}
