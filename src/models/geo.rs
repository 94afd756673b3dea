// src/models/geo.rs
// Core hierarchy and identifier types shared by the builder, fuser and resolver

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::constants::REGISTRY_NUMBER_WIDTH;

/// Synthetic identifier of a node in the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeLevel {
    Region,
    District,
    Municipality,
}

impl NodeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLevel::Region => "REGION",
            NodeLevel::District => "DISTRICT",
            NodeLevel::Municipality => "MUNICIPALITY",
        }
    }

    /// Zero-based depth of this level in the region → district → municipality tree.
    pub fn depth(&self) -> usize {
        match self {
            NodeLevel::Region => 0,
            NodeLevel::District => 1,
            NodeLevel::Municipality => 2,
        }
    }

    pub fn parent_level(&self) -> Option<NodeLevel> {
        match self {
            NodeLevel::Region => None,
            NodeLevel::District => Some(NodeLevel::Region),
            NodeLevel::Municipality => Some(NodeLevel::District),
        }
    }
}

impl fmt::Display for NodeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGION" => Ok(NodeLevel::Region),
            "DISTRICT" => Ok(NodeLevel::District),
            "MUNICIPALITY" => Ok(NodeLevel::Municipality),
            other => Err(anyhow::anyhow!("Unknown node level '{}'", other)),
        }
    }
}

/// A node of the region → district → municipality forest.
///
/// `path` is the materialized path from the root down to and including this
/// node, so `path.last() == Some(&id)` and `path.len() == level.depth() + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoNode {
    pub id: NodeId,
    pub name: String,
    pub level: NodeLevel,
    pub parent_id: Option<NodeId>,
    pub path: Vec<NodeId>,
}

impl GeoNode {
    /// Ltree label form of the materialized path, e.g. `1.15.230`.
    pub fn path_label(&self) -> String {
        path_to_label(&self.path)
    }
}

pub fn path_to_label(path: &[NodeId]) -> String {
    path.iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

pub fn path_from_label(label: &str) -> anyhow::Result<Vec<NodeId>> {
    if label.is_empty() {
        return Ok(Vec::new());
    }
    label
        .split('.')
        .map(|part| {
            part.parse::<i64>()
                .map(NodeId)
                .map_err(|e| anyhow::anyhow!("Invalid path label segment '{}': {}", part, e))
        })
        .collect()
}

/// Identifier scheme of a secondary code attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemeTag {
    RegistryNumber,
    Lau2,
    Lau1,
    Nuts3,
    Cadastral,
}

impl SchemeTag {
    pub const ALL: [SchemeTag; 5] = [
        SchemeTag::Lau2,
        SchemeTag::RegistryNumber,
        SchemeTag::Cadastral,
        SchemeTag::Lau1,
        SchemeTag::Nuts3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeTag::RegistryNumber => "REGISTRY_NUMBER",
            SchemeTag::Lau2 => "LAU2",
            SchemeTag::Lau1 => "LAU1",
            SchemeTag::Nuts3 => "NUTS3",
            SchemeTag::Cadastral => "CADASTRAL",
        }
    }

    /// Fixed priority weight; higher means a more precise scheme.
    pub fn priority(&self) -> i32 {
        match self {
            SchemeTag::Lau2 => 100,
            SchemeTag::RegistryNumber => 80,
            SchemeTag::Cadastral => 70,
            SchemeTag::Lau1 => 60,
            SchemeTag::Nuts3 => 50,
        }
    }

    /// Width the code value is left-padded to with zeros, if the scheme is fixed-width.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            SchemeTag::RegistryNumber => Some(REGISTRY_NUMBER_WIDTH),
            _ => None,
        }
    }

    /// Brings a raw source value into the stored form for this scheme.
    pub fn canonical_value(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.fixed_width() {
            Some(width) => format!("{:0>width$}", trimmed, width = width),
            None => trimmed.to_string(),
        }
    }

    /// Parses a caller-facing filter name (`ico`, `zuj`, `lau2`, `lau1`, `nuts3`, `ruian`, `cadastral`).
    pub fn from_filter(filter: &str) -> Option<SchemeTag> {
        match filter.trim().to_lowercase().as_str() {
            "ico" | "registry_number" => Some(SchemeTag::RegistryNumber),
            "zuj" | "lau2" => Some(SchemeTag::Lau2),
            "lau1" => Some(SchemeTag::Lau1),
            "nuts3" => Some(SchemeTag::Nuts3),
            "ruian" | "cadastral" => Some(SchemeTag::Cadastral),
            _ => None,
        }
    }
}

impl fmt::Display for SchemeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTRY_NUMBER" => Ok(SchemeTag::RegistryNumber),
            "LAU2" => Ok(SchemeTag::Lau2),
            "LAU1" => Ok(SchemeTag::Lau1),
            "NUTS3" => Ok(SchemeTag::Nuts3),
            "CADASTRAL" => Ok(SchemeTag::Cadastral),
            other => Err(anyhow::anyhow!("Unknown identifier scheme '{}'", other)),
        }
    }
}

/// Secondary code to be bound to exactly one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub node_id: NodeId,
    pub value: String,
    pub scheme: SchemeTag,
    pub priority: i32,
}

impl IdentifierRecord {
    pub fn new(node_id: NodeId, raw_value: &str, scheme: SchemeTag) -> Self {
        Self {
            node_id,
            value: scheme.canonical_value(raw_value),
            scheme,
            priority: scheme.priority(),
        }
    }
}

/// A stored identifier joined with its owning node, as returned by lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierHit {
    pub record_id: i64,
    pub node_name: String,
    pub node_level: NodeLevel,
    pub node_path: Vec<NodeId>,
    pub value: String,
    pub scheme: SchemeTag,
    pub priority: i32,
}

/// Strict ancestor of a node, used for breadcrumbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    pub name: String,
    pub level: NodeLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_number_is_zero_padded() {
        assert_eq!(SchemeTag::RegistryNumber.canonical_value("231401"), "00231401");
        assert_eq!(SchemeTag::RegistryNumber.canonical_value("00231401"), "00231401");
        assert_eq!(SchemeTag::Lau2.canonical_value(" 554782 "), "554782");
    }

    #[test]
    fn test_filter_aliases() {
        assert_eq!(SchemeTag::from_filter("zuj"), Some(SchemeTag::Lau2));
        assert_eq!(SchemeTag::from_filter("LAU2"), Some(SchemeTag::Lau2));
        assert_eq!(SchemeTag::from_filter("ico"), Some(SchemeTag::RegistryNumber));
        assert_eq!(SchemeTag::from_filter("ruian"), Some(SchemeTag::Cadastral));
        assert_eq!(SchemeTag::from_filter("lau1"), Some(SchemeTag::Lau1));
        assert_eq!(SchemeTag::from_filter("postcode"), None);
    }

    #[test]
    fn test_path_label_roundtrip() {
        let path = vec![NodeId(1), NodeId(15), NodeId(230)];
        assert_eq!(path_to_label(&path), "1.15.230");
        assert_eq!(path_from_label("1.15.230").unwrap(), path);
        assert!(path_from_label("1.x").is_err());
    }

    #[test]
    fn test_scheme_db_names_parse_back() {
        for scheme in SchemeTag::ALL {
            assert_eq!(scheme.as_str().parse::<SchemeTag>().unwrap(), scheme);
        }
        assert!("ICO".parse::<SchemeTag>().is_err());
    }
}
