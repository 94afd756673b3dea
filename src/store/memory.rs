// src/store/memory.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use crate::models::{Ancestor, GeoNode, IdentifierHit, IdentifierRecord, NodeId, NodeLevel, SchemeTag};
use crate::resolution::trigram;
use crate::store::{GeoStore, ScoredHit};

#[derive(Debug, Default)]
struct MemoryState {
    nodes: BTreeMap<NodeId, GeoNode>,
    /// (record id, record), ids assigned in insertion order starting at 1.
    identifiers: Vec<(i64, IdentifierRecord)>,
}

impl MemoryState {
    fn hit(&self, record_id: i64, record: &IdentifierRecord) -> Option<IdentifierHit> {
        let node = self.nodes.get(&record.node_id)?;
        Some(IdentifierHit {
            record_id,
            node_name: node.name.clone(),
            node_level: node.level,
            node_path: node.path.clone(),
            value: record.value.clone(),
            scheme: record.scheme,
            priority: record.priority,
        })
    }
}

fn scheme_matches(filter: Option<SchemeTag>, scheme: SchemeTag) -> bool {
    filter.map_or(true, |f| f == scheme)
}

/// In-process store with the same contract as the Postgres one.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeoStore for InMemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn node_count(&self) -> Result<usize> {
        Ok(self.state.read().await.nodes.len())
    }

    async fn insert_hierarchy(&self, nodes: &[GeoNode]) -> Result<usize> {
        let mut state = self.state.write().await;

        // Validate everything first so a bad batch leaves the store untouched.
        let mut pending: HashSet<NodeId> = HashSet::new();
        for node in nodes {
            if state.nodes.contains_key(&node.id) || !pending.insert(node.id) {
                bail!("Duplicate node id {}", node.id);
            }
            if let Some(parent_id) = node.parent_id {
                if !state.nodes.contains_key(&parent_id) && !pending.contains(&parent_id) {
                    bail!("Node {} references missing parent {}", node.id, parent_id);
                }
            }
        }

        for node in nodes {
            state.nodes.insert(node.id, node.clone());
        }
        Ok(nodes.len())
    }

    async fn nodes_at_level(&self, level: NodeLevel) -> Result<Vec<GeoNode>> {
        let state = self.state.read().await;
        Ok(state
            .nodes
            .values()
            .filter(|n| n.level == level)
            .cloned()
            .collect())
    }

    async fn identifier_count(&self, schemes: &[SchemeTag]) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .identifiers
            .iter()
            .filter(|(_, r)| schemes.contains(&r.scheme))
            .count())
    }

    async fn insert_identifiers(&self, records: &[IdentifierRecord]) -> Result<usize> {
        let mut state = self.state.write().await;
        if let Some(orphan) = records.iter().find(|r| !state.nodes.contains_key(&r.node_id)) {
            bail!(
                "Identifier {} ({}) references missing node {}",
                orphan.value,
                orphan.scheme,
                orphan.node_id
            );
        }
        let mut next_id = state.identifiers.len() as i64 + 1;
        for record in records {
            state.identifiers.push((next_id, record.clone()));
            next_id += 1;
        }
        Ok(records.len())
    }

    async fn exact_lookup(
        &self,
        values: &[String],
        filter: Option<SchemeTag>,
    ) -> Result<Vec<IdentifierHit>> {
        let state = self.state.read().await;
        let mut hits: Vec<IdentifierHit> = state
            .identifiers
            .iter()
            .filter(|(_, r)| scheme_matches(filter, r.scheme) && values.contains(&r.value))
            .filter_map(|(id, r)| state.hit(*id, r))
            .collect();
        hits.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        Ok(hits)
    }

    async fn similarity_lookup(
        &self,
        query: &str,
        filter: Option<SchemeTag>,
        limit: usize,
    ) -> Result<Vec<ScoredHit>> {
        let state = self.state.read().await;
        let mut scored: Vec<ScoredHit> = state
            .identifiers
            .iter()
            .filter(|(_, r)| scheme_matches(filter, r.scheme))
            .filter_map(|(id, r)| state.hit(*id, r))
            .map(|hit| {
                let distance = trigram::distance(query, &hit.value)
                    .min(trigram::distance(query, &hit.node_name));
                ScoredHit { hit, distance }
            })
            .collect();
        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| b.hit.priority.cmp(&a.hit.priority))
                .then_with(|| a.hit.record_id.cmp(&b.hit.record_id))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn ancestors(&self, path: &[NodeId]) -> Result<Vec<Ancestor>> {
        let state = self.state.read().await;
        let strict = match path.split_last() {
            Some((_, ancestors)) => ancestors,
            None => return Ok(Vec::new()),
        };
        Ok(strict
            .iter()
            .filter_map(|id| state.nodes.get(id))
            .map(|n| Ancestor {
                name: n.name.clone(),
                level: n.level,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str, level: NodeLevel, parent: Option<&GeoNode>) -> GeoNode {
        let mut path = parent.map(|p| p.path.clone()).unwrap_or_default();
        path.push(NodeId(id));
        GeoNode {
            id: NodeId(id),
            name: name.to_string(),
            level,
            parent_id: parent.map(|p| p.id),
            path,
        }
    }

    #[tokio::test]
    async fn test_orphan_nodes_are_rejected_atomically() {
        let store = InMemoryStore::new();
        let region = node(1, "Kraj Vysočina", NodeLevel::Region, None);
        let mut orphan = node(2, "Jihlava", NodeLevel::District, Some(&region));
        orphan.parent_id = Some(NodeId(99));
        assert!(store.insert_hierarchy(&[region, orphan]).await.is_err());
        assert_eq!(store.node_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_lookup_orders_by_priority() {
        let store = InMemoryStore::new();
        let region = node(1, "Kraj Vysočina", NodeLevel::Region, None);
        let district = node(2, "Jihlava", NodeLevel::District, Some(&region));
        store.insert_hierarchy(&[region, district]).await.unwrap();
        store
            .insert_identifiers(&[
                IdentifierRecord::new(NodeId(2), "CZ0632", SchemeTag::Lau1),
                IdentifierRecord::new(NodeId(1), "CZ0632", SchemeTag::Nuts3),
                IdentifierRecord::new(NodeId(2), "CZ0632", SchemeTag::Cadastral),
            ])
            .await
            .unwrap();

        let hits = store.exact_lookup(&["CZ0632".to_string()], None).await.unwrap();
        let schemes: Vec<SchemeTag> = hits.iter().map(|h| h.scheme).collect();
        assert_eq!(schemes, vec![SchemeTag::Cadastral, SchemeTag::Lau1, SchemeTag::Nuts3]);

        let filtered = store
            .exact_lookup(&["CZ0632".to_string()], Some(SchemeTag::Nuts3))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].node_name, "Kraj Vysočina");
    }

    #[tokio::test]
    async fn test_identifiers_need_an_existing_node() {
        let store = InMemoryStore::new();
        let result = store
            .insert_identifiers(&[IdentifierRecord::new(NodeId(7), "1", SchemeTag::Lau2)])
            .await;
        assert!(result.is_err());
        assert_eq!(store.identifier_count(&[SchemeTag::Lau2]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ancestors_are_root_first_and_exclude_self() {
        let store = InMemoryStore::new();
        let region = node(1, "Jihomoravský kraj", NodeLevel::Region, None);
        let district = node(2, "Brno-město", NodeLevel::District, Some(&region));
        let town = node(3, "Brno", NodeLevel::Municipality, Some(&district));
        let path = town.path.clone();
        store.insert_hierarchy(&[region, district, town]).await.unwrap();

        let ancestors = store.ancestors(&path).await.unwrap();
        assert_eq!(
            ancestors,
            vec![
                Ancestor { name: "Jihomoravský kraj".into(), level: NodeLevel::Region },
                Ancestor { name: "Brno-město".into(), level: NodeLevel::District },
            ]
        );
        assert!(store.ancestors(&[NodeId(1)]).await.unwrap().is_empty());
    }
}
