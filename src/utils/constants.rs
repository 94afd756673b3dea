// src/utils/constants.rs

/// Registry numbers (ICO) are stored left-padded with zeros to this width.
pub const REGISTRY_NUMBER_WIDTH: usize = 8;

/// Maximum number of candidates returned by the similarity phase.
pub const FUZZY_RESULT_LIMIT: usize = 5;

/// Fuzzy candidates below this confidence (in percent) are discarded.
pub const MIN_CONFIDENCE_PERCENT: f64 = 10.0;

/// Region bucket for districts missing from the reference table.
pub const UNKNOWN_REGION_NAME: &str = "Unknown region";

/// Breadcrumb shown for nodes that have no ancestors.
pub const ROOT_NODE_MARKER: &str = "Root node";

/// Pseudo-region rows in the statistical office code tables.
pub const EXTRA_REGIO_NAME: &str = "Extra-Regio";
