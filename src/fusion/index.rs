// src/fusion/index.rs
use log::debug;
use std::collections::HashMap;

use crate::fusion::passes::FusionPass;
use crate::models::{GeoNode, NodeId, NodeLevel};
use crate::normalize::capital_short_name;

/// Name → node lookup over one hierarchy level, keyed the way a pass normalizes names.
///
/// When several nodes share a name the one with the lowest id wins the plain
/// key; the (name, parent name) key still tells them apart.
#[derive(Debug, Default)]
pub struct NameIndex {
    by_name: HashMap<String, NodeId>,
    by_name_in_parent: HashMap<(String, String), NodeId>,
    shared_names: usize,
}

impl NameIndex {
    /// `nodes` are the target-level nodes; `parents` the level above, for qualified keys.
    pub fn build(pass: &FusionPass, nodes: &[GeoNode], parents: &[GeoNode]) -> Self {
        let parent_names: HashMap<NodeId, String> = parents
            .iter()
            .map(|p| (p.id, pass.parent_key(&p.name)))
            .collect();

        let mut ordered: Vec<&GeoNode> = nodes.iter().collect();
        ordered.sort_by_key(|n| n.id);

        let mut index = NameIndex::default();
        for node in &ordered {
            let key = pass.stored_key(&node.name);
            if index.by_name.contains_key(&key) {
                index.shared_names += 1;
            } else {
                index.by_name.insert(key.clone(), node.id);
            }
            if let Some(parent_name) = node.parent_id.and_then(|p| parent_names.get(&p)) {
                index
                    .by_name_in_parent
                    .entry((key, parent_name.clone()))
                    .or_insert(node.id);
            }
        }

        // Code tables name the capital by its short form, the registry by its full title.
        if matches!(pass.target_level, NodeLevel::District | NodeLevel::Region) {
            for node in &ordered {
                if let Some(short) = capital_short_name(&node.name) {
                    index.by_name.entry(short.to_string()).or_insert(node.id);
                }
            }
        }

        debug!(
            "[{}] name index: {} keys, {} qualified keys, {} shared names",
            pass.name,
            index.by_name.len(),
            index.by_name_in_parent.len(),
            index.shared_names
        );
        index
    }

    pub fn lookup(&self, name_key: &str, parent_key: Option<&str>) -> Option<NodeId> {
        if let Some(parent) = parent_key {
            let qualified = (name_key.to_string(), parent.to_string());
            if let Some(&id) = self.by_name_in_parent.get(&qualified) {
                return Some(id);
            }
        }
        self.by_name.get(name_key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn shared_names(&self) -> usize {
        self.shared_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::passes::{DISTRICT_CODES_PASS, NUTS3_PASS, REGISTRY_NUMBER_PASS};

    fn node(id: i64, name: &str, level: NodeLevel, parent: Option<i64>) -> GeoNode {
        let mut path: Vec<NodeId> = parent.map(NodeId).into_iter().collect();
        path.push(NodeId(id));
        GeoNode {
            id: NodeId(id),
            name: name.to_string(),
            level,
            parent_id: parent.map(NodeId),
            path,
        }
    }

    #[test]
    fn test_capital_is_reachable_by_both_names() {
        let districts = vec![
            node(10, "Hlavní město Praha", NodeLevel::District, Some(1)),
            node(11, "Brno-město", NodeLevel::District, Some(2)),
        ];
        let index = NameIndex::build(&DISTRICT_CODES_PASS, &districts, &[]);
        assert_eq!(index.lookup("Hlavní město Praha", None), Some(NodeId(10)));
        assert_eq!(index.lookup("Praha", None), Some(NodeId(10)));
        assert_eq!(index.lookup("Brno-město", None), Some(NodeId(11)));

        let regions = vec![node(1, "Hlavní město Praha", NodeLevel::Region, None)];
        let index = NameIndex::build(&NUTS3_PASS, &regions, &[]);
        assert_eq!(index.lookup("Praha", None), Some(NodeId(1)));
    }

    #[test]
    fn test_real_short_name_beats_capital_alias() {
        let districts = vec![
            node(10, "Hlavní město Praha", NodeLevel::District, Some(1)),
            node(12, "Praha", NodeLevel::District, Some(1)),
        ];
        let index = NameIndex::build(&DISTRICT_CODES_PASS, &districts, &[]);
        assert_eq!(index.lookup("Praha", None), Some(NodeId(12)));
    }

    #[test]
    fn test_parent_disambiguates_shared_names() {
        let districts = vec![
            node(20, "Kladno", NodeLevel::District, Some(1)),
            node(21, "Blansko", NodeLevel::District, Some(2)),
        ];
        let towns = vec![
            node(101, "Lhota", NodeLevel::Municipality, Some(20)),
            node(102, "Lhota", NodeLevel::Municipality, Some(21)),
        ];
        let index = NameIndex::build(&REGISTRY_NUMBER_PASS, &towns, &districts);
        assert_eq!(index.shared_names(), 1);
        assert_eq!(index.lookup("Lhota", Some("Blansko")), Some(NodeId(102)));
        assert_eq!(index.lookup("Lhota", Some("Kladno")), Some(NodeId(101)));
        // Unknown parent falls back to the lowest id.
        assert_eq!(index.lookup("Lhota", Some("Atlantis")), Some(NodeId(101)));
        assert_eq!(index.lookup("Lhota", None), Some(NodeId(101)));
        assert_eq!(index.lookup("Lhotka", None), None);
    }

    #[test]
    fn test_stored_municipality_names_are_not_renormalized() {
        let districts = vec![
            node(20, "Tachov", NodeLevel::District, Some(1)),
            node(21, "Plzeň-sever", NodeLevel::District, Some(1)),
        ];
        let towns = vec![
            node(101, "Touškov", NodeLevel::Municipality, Some(20)),
            node(102, "Město Touškov", NodeLevel::Municipality, Some(21)),
        ];
        let index = NameIndex::build(&REGISTRY_NUMBER_PASS, &towns, &districts);
        assert_eq!(index.shared_names(), 0);

        let town_key = REGISTRY_NUMBER_PASS.name_key("Město Město Touškov");
        assert_eq!(index.lookup(&town_key, Some("Plzeň-sever")), Some(NodeId(102)));
        assert_eq!(index.lookup(&town_key, None), Some(NodeId(102)));
        let village_key = REGISTRY_NUMBER_PASS.name_key("Obec Touškov");
        assert_eq!(index.lookup(&village_key, Some("Tachov")), Some(NodeId(101)));
    }
}
