// src/hierarchy/reference.rs
//! Versioned region → district reference table, loaded from a JSON dataset
//! (see `data/region_districts.json`) rather than compiled in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::BuildError;
use crate::normalize::normalize_separators;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionEntry {
    pub name: String,
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub version: String,
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Clone)]
pub struct RegionDistrictTable {
    version: String,
    regions: Vec<String>,
    /// Lowercased, separator-normalized district name -> index into `regions`.
    district_to_region: HashMap<String, usize>,
}

fn district_key(district: &str) -> String {
    normalize_separators(district).to_lowercase()
}

impl RegionDistrictTable {
    pub fn from_document(doc: ReferenceDocument) -> Result<Self, String> {
        let mut regions = Vec::with_capacity(doc.regions.len());
        let mut district_to_region = HashMap::new();

        for (idx, entry) in doc.regions.into_iter().enumerate() {
            let region_name = entry.name.trim().to_string();
            if region_name.is_empty() {
                return Err(format!("region #{} has an empty name", idx + 1));
            }
            for district in &entry.districts {
                let key = district_key(district);
                if let Some(previous) = district_to_region.insert(key, idx) {
                    return Err(format!(
                        "district '{}' is listed under both '{}' and '{}'",
                        district, regions[previous], region_name
                    ));
                }
            }
            regions.push(region_name);
        }

        Ok(Self {
            version: doc.version,
            regions,
            district_to_region,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let doc: ReferenceDocument = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Self::from_document(doc)
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BuildError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|reason| BuildError::InvalidReference {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn region_names(&self) -> &[String] {
        &self.regions
    }

    pub fn district_count(&self) -> usize {
        self.district_to_region.len()
    }

    /// Case-insensitive lookup of the region a district belongs to.
    pub fn region_for_district(&self, district: &str) -> Option<&str> {
        self.district_to_region
            .get(&district_key(district))
            .map(|&idx| self.regions[idx].as_str())
    }
}
