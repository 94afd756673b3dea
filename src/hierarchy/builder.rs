// src/hierarchy/builder.rs
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use crate::hierarchy::reference::RegionDistrictTable;
use crate::models::{GeoNode, NodeId, NodeLevel};
use crate::normalize::{normalize_name, normalize_separators};
use crate::utils::constants::UNKNOWN_REGION_NAME;

/// One row of the municipality/registry extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MunicipalityRow {
    pub registry_number: String,
    pub name: String,
    pub district: String,
}

impl MunicipalityRow {
    /// Column layout: registry number, official name, district name.
    pub fn from_columns(columns: &[String]) -> Option<Self> {
        if columns.len() < 3 {
            return None;
        }
        let name = columns[1].trim();
        let district = columns[2].trim();
        if name.is_empty() || district.is_empty() {
            return None;
        }
        Some(Self {
            registry_number: columns[0].trim().to_string(),
            name: name.to_string(),
            district: district.to_string(),
        })
    }
}

/// A finished, immutable forest of region-rooted trees.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<GeoNode>,
    orphaned_districts: usize,
}

impl Hierarchy {
    /// Nodes in creation order: every region, then every district, then every municipality.
    pub fn nodes(&self) -> &[GeoNode] {
        &self.nodes
    }

    pub fn count_level(&self, level: NodeLevel) -> usize {
        self.nodes.iter().filter(|n| n.level == level).count()
    }

    pub fn orphaned_districts(&self) -> usize {
        self.orphaned_districts
    }

    pub fn find(&self, level: NodeLevel, name: &str) -> Option<&GeoNode> {
        self.nodes.iter().find(|n| n.level == level && n.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct PendingDistrict {
    name: String,
    region: usize,
}

struct PendingMunicipality {
    name: String,
    district: usize,
}

/// Collects extract rows and lays them out as region → district → municipality.
///
/// Regions and districts are created lazily on first sight; every row yields a
/// new municipality, since a municipality name alone is not unique nationally.
pub struct HierarchyBuilder<'a> {
    reference: &'a RegionDistrictTable,
    regions: Vec<String>,
    region_index: HashMap<String, usize>,
    districts: Vec<PendingDistrict>,
    district_index: HashMap<String, usize>,
    municipalities: Vec<PendingMunicipality>,
    orphaned: HashSet<String>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(reference: &'a RegionDistrictTable) -> Self {
        Self {
            reference,
            regions: Vec::new(),
            region_index: HashMap::new(),
            districts: Vec::new(),
            district_index: HashMap::new(),
            municipalities: Vec::new(),
            orphaned: HashSet::new(),
        }
    }

    pub fn add_row(&mut self, row: &MunicipalityRow) {
        let municipality_name = normalize_name(&row.name);
        let district_name = normalize_separators(&row.district);

        let district = match self.district_index.get(&district_name) {
            Some(&idx) => idx,
            None => {
                let region_name = match self.reference.region_for_district(&district_name) {
                    Some(region) => region.to_string(),
                    None => {
                        if self.orphaned.insert(district_name.clone()) {
                            warn!(
                                "District '{}' is missing from the reference table, assigning it to '{}'",
                                district_name, UNKNOWN_REGION_NAME
                            );
                        }
                        UNKNOWN_REGION_NAME.to_string()
                    }
                };
                let region = self.region_slot(region_name);
                self.districts.push(PendingDistrict {
                    name: district_name.clone(),
                    region,
                });
                let idx = self.districts.len() - 1;
                self.district_index.insert(district_name, idx);
                idx
            }
        };

        self.municipalities.push(PendingMunicipality {
            name: municipality_name,
            district,
        });
    }

    fn region_slot(&mut self, region_name: String) -> usize {
        if let Some(&idx) = self.region_index.get(&region_name) {
            return idx;
        }
        self.regions.push(region_name.clone());
        let idx = self.regions.len() - 1;
        self.region_index.insert(region_name, idx);
        idx
    }

    /// Assigns ids level by level so a parent always exists before its children,
    /// and fixes every materialized path from the parent's path at creation.
    pub fn finish(self) -> Hierarchy {
        let total = self.regions.len() + self.districts.len() + self.municipalities.len();
        let mut nodes: Vec<GeoNode> = Vec::with_capacity(total);
        let mut next_id: i64 = 1;

        let mut region_ids = Vec::with_capacity(self.regions.len());
        for name in self.regions {
            let id = NodeId(next_id);
            next_id += 1;
            region_ids.push(nodes.len());
            nodes.push(GeoNode {
                id,
                name,
                level: NodeLevel::Region,
                parent_id: None,
                path: vec![id],
            });
        }

        let mut district_slots = Vec::with_capacity(self.districts.len());
        for district in self.districts {
            let parent = &nodes[region_ids[district.region]];
            let node = child_of(parent, NodeId(next_id), district.name, NodeLevel::District);
            next_id += 1;
            district_slots.push(nodes.len());
            nodes.push(node);
        }

        for municipality in self.municipalities {
            let parent = &nodes[district_slots[municipality.district]];
            let node = child_of(parent, NodeId(next_id), municipality.name, NodeLevel::Municipality);
            next_id += 1;
            nodes.push(node);
        }

        debug!("Hierarchy laid out with {} nodes", nodes.len());
        Hierarchy {
            nodes,
            orphaned_districts: self.orphaned.len(),
        }
    }
}

fn child_of(parent: &GeoNode, id: NodeId, name: String, level: NodeLevel) -> GeoNode {
    let mut path = Vec::with_capacity(parent.path.len() + 1);
    path.extend_from_slice(&parent.path);
    path.push(id);
    GeoNode {
        id,
        name,
        level,
        parent_id: Some(parent.id),
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> RegionDistrictTable {
        RegionDistrictTable::from_json_str(
            r#"{"version": "t", "regions": [
                {"name": "Hlavní město Praha", "districts": ["Hlavní město Praha"]},
                {"name": "Jihomoravský kraj", "districts": ["Brno-město", "Blansko"]},
                {"name": "Středočeský kraj", "districts": ["Kladno"]}
            ]}"#,
        )
        .unwrap()
    }

    fn row(ico: &str, name: &str, district: &str) -> MunicipalityRow {
        MunicipalityRow {
            registry_number: ico.to_string(),
            name: name.to_string(),
            district: district.to_string(),
        }
    }

    fn build(rows: &[MunicipalityRow]) -> Hierarchy {
        let table = reference();
        let mut builder = HierarchyBuilder::new(&table);
        for r in rows {
            builder.add_row(r);
        }
        builder.finish()
    }

    #[test]
    fn test_levels_are_created_in_order() {
        let h = build(&[
            row("1", "Obec Lhota", "Kladno"),
            row("2", "Statutární město Brno", "Brno - město"),
            row("3", "Obec Lhota", "Blansko"),
        ]);
        let levels: Vec<NodeLevel> = h.nodes().iter().map(|n| n.level).collect();
        let mut sorted = levels.clone();
        sorted.sort();
        assert_eq!(levels, sorted);
        assert_eq!(h.count_level(NodeLevel::Region), 2);
        assert_eq!(h.count_level(NodeLevel::District), 3);
        assert_eq!(h.count_level(NodeLevel::Municipality), 3);
        assert!(h.find(NodeLevel::District, "Brno-město").is_some());
        assert!(h.find(NodeLevel::Municipality, "Brno").is_some());
    }

    #[test]
    fn test_paths_extend_parent_paths() {
        let h = build(&[
            row("1", "Obec Lhota", "Kladno"),
            row("2", "Hlavní město Praha", "Hlavní město Praha"),
            row("3", "Město Blansko", "Blansko"),
        ]);
        let by_id: HashMap<NodeId, &GeoNode> = h.nodes().iter().map(|n| (n.id, n)).collect();
        for node in h.nodes() {
            assert_eq!(node.path.len(), node.level.depth() + 1);
            assert_eq!(node.path.last(), Some(&node.id));
            match node.parent_id {
                Some(parent_id) => {
                    let parent = by_id[&parent_id];
                    assert!(parent.id < node.id);
                    let mut expected = parent.path.clone();
                    expected.push(node.id);
                    assert_eq!(node.path, expected);
                }
                None => {
                    assert_eq!(node.level, NodeLevel::Region);
                    assert_eq!(node.path, vec![node.id]);
                }
            }
        }
    }

    #[test]
    fn test_same_name_in_different_districts_stays_separate() {
        let h = build(&[
            row("1", "Obec Lhota", "Kladno"),
            row("2", "Obec Lhota", "Blansko"),
        ]);
        let lhotas: Vec<&GeoNode> = h
            .nodes()
            .iter()
            .filter(|n| n.level == NodeLevel::Municipality && n.name == "Lhota")
            .collect();
        assert_eq!(lhotas.len(), 2);
        assert_ne!(lhotas[0].parent_id, lhotas[1].parent_id);
    }

    #[test]
    fn test_unknown_district_goes_to_sentinel_region() {
        let h = build(&[row("1", "Obec Nikde", "Atlantis"), row("2", "Obec Jinde", "Atlantis")]);
        assert_eq!(h.orphaned_districts(), 1);
        let region = h.find(NodeLevel::Region, UNKNOWN_REGION_NAME).unwrap();
        let district = h.find(NodeLevel::District, "Atlantis").unwrap();
        assert_eq!(district.parent_id, Some(region.id));
        assert_eq!(h.count_level(NodeLevel::Municipality), 2);
    }

    #[test]
    fn test_row_parsing_rejects_short_or_blank_rows() {
        let cols = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(MunicipalityRow::from_columns(&cols(&["1", "Obec Lhota"])).is_none());
        assert!(MunicipalityRow::from_columns(&cols(&["1", " ", "Kladno"])).is_none());
        let parsed = MunicipalityRow::from_columns(&cols(&["231401", "Obec Lhota ", "Kladno"])).unwrap();
        assert_eq!(parsed, row("231401", "Obec Lhota", "Kladno"));
    }
}
