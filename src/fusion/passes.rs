// src/fusion/passes.rs
//! Column layouts of the source extracts, one descriptor per fusion pass.

use crate::models::{NodeLevel, SchemeTag};
use crate::normalize::{normalize_name, normalize_separators};
use crate::utils::constants::EXTRA_REGIO_NAME;

/// Which configured extract a pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Municipal self-government registry: registry number; name; district.
    MunicipalityRegistry,
    /// ZUJ list with LAU2 codes.
    ZujRegistry,
    /// CIS0100 region table with NUTS3 codes.
    RegionCodeTable,
    /// CIS0101 district table with LAU1 and RUIAN codes.
    DistrictCodeTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeColumn {
    pub scheme: SchemeTag,
    pub column: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FusionPass {
    pub name: &'static str,
    pub source: SourceKind,
    pub target_level: NodeLevel,
    pub delimiter: u8,
    pub name_column: usize,
    /// Column naming the parent node, used to tell same-named nodes apart.
    pub parent_column: Option<usize>,
    pub codes: &'static [CodeColumn],
    /// Source names carry administrative prefixes ("Obec Lhota") that must be
    /// stripped before joining. Other extracts list plain names.
    pub prefixed_names: bool,
    /// Rows with these names are not real units and are ignored.
    pub ignored_names: &'static [&'static str],
}

pub const REGISTRY_NUMBER_PASS: FusionPass = FusionPass {
    name: "REGISTRY_NUMBER",
    source: SourceKind::MunicipalityRegistry,
    target_level: NodeLevel::Municipality,
    delimiter: b';',
    name_column: 1,
    parent_column: Some(2),
    codes: &[CodeColumn {
        scheme: SchemeTag::RegistryNumber,
        column: 0,
    }],
    prefixed_names: true,
    ignored_names: &[],
};

pub const LAU2_PASS: FusionPass = FusionPass {
    name: "LAU2",
    source: SourceKind::ZujRegistry,
    target_level: NodeLevel::Municipality,
    delimiter: b',',
    name_column: 5,
    parent_column: None,
    codes: &[CodeColumn {
        scheme: SchemeTag::Lau2,
        column: 3,
    }],
    prefixed_names: false,
    ignored_names: &[],
};

pub const NUTS3_PASS: FusionPass = FusionPass {
    name: "NUTS3",
    source: SourceKind::RegionCodeTable,
    target_level: NodeLevel::Region,
    delimiter: b',',
    name_column: 5,
    parent_column: None,
    codes: &[CodeColumn {
        scheme: SchemeTag::Nuts3,
        column: 8,
    }],
    prefixed_names: false,
    ignored_names: &[EXTRA_REGIO_NAME],
};

pub const DISTRICT_CODES_PASS: FusionPass = FusionPass {
    name: "DISTRICT_CODES",
    source: SourceKind::DistrictCodeTable,
    target_level: NodeLevel::District,
    delimiter: b',',
    name_column: 5,
    parent_column: None,
    codes: &[
        CodeColumn {
            scheme: SchemeTag::Lau1,
            column: 9,
        },
        CodeColumn {
            scheme: SchemeTag::Cadastral,
            column: 11,
        },
    ],
    prefixed_names: false,
    ignored_names: &[EXTRA_REGIO_NAME],
};

/// Pass order used by the build pipeline.
pub const ALL_PASSES: [FusionPass; 4] = [
    REGISTRY_NUMBER_PASS,
    LAU2_PASS,
    NUTS3_PASS,
    DISTRICT_CODES_PASS,
];

impl FusionPass {
    pub fn schemes(&self) -> Vec<SchemeTag> {
        self.codes.iter().map(|c| c.scheme).collect()
    }

    /// The pass that attaches `scheme`.
    pub fn for_scheme(scheme: SchemeTag) -> FusionPass {
        match scheme {
            SchemeTag::RegistryNumber => REGISTRY_NUMBER_PASS,
            SchemeTag::Lau2 => LAU2_PASS,
            SchemeTag::Nuts3 => NUTS3_PASS,
            SchemeTag::Lau1 | SchemeTag::Cadastral => DISTRICT_CODES_PASS,
        }
    }

    /// Fewest fields a row needs before any of its columns can be read.
    pub fn min_columns(&self) -> usize {
        let highest = self
            .codes
            .iter()
            .map(|c| c.column)
            .chain(std::iter::once(self.name_column))
            .chain(self.parent_column)
            .max()
            .unwrap_or(0);
        highest + 1
    }

    /// Join key for a source row's name, normalized the way the builder stored it.
    pub fn name_key(&self, raw: &str) -> String {
        match self.target_level {
            NodeLevel::Municipality if self.prefixed_names => normalize_name(raw),
            NodeLevel::Municipality => raw.trim().to_string(),
            NodeLevel::District | NodeLevel::Region => normalize_separators(raw),
        }
    }

    /// Join key for a name already stored on a node. Municipality names were
    /// normalized once by the builder and are used as stored.
    pub fn stored_key(&self, stored: &str) -> String {
        match self.target_level {
            NodeLevel::Municipality => stored.to_string(),
            NodeLevel::District | NodeLevel::Region => normalize_separators(stored),
        }
    }

    /// Join key for a parent (district or region) name.
    pub fn parent_key(&self, raw: &str) -> String {
        normalize_separators(raw)
    }

    pub fn is_ignored(&self, name_key: &str) -> bool {
        self.ignored_names.contains(&name_key)
    }
}
