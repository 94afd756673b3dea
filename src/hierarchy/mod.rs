// src/hierarchy/mod.rs
pub mod builder;
pub mod reference;

use log::{info, warn};
use std::path::Path;
use std::time::Instant;

use crate::error::BuildError;
use crate::models::{BuildReport, NodeLevel};
use crate::sources;
use crate::store::GeoStore;

pub use builder::{Hierarchy, HierarchyBuilder, MunicipalityRow};
pub use reference::RegionDistrictTable;

const EXTRACT_DELIMITER: u8 = b';';

/// Builds the region → district → municipality forest from the municipality
/// extract and writes it in one batch.
///
/// Does nothing when the store already holds nodes.
pub async fn build_hierarchy<S: GeoStore + ?Sized>(
    store: &S,
    reference: &RegionDistrictTable,
    extract_path: &Path,
) -> Result<BuildReport, BuildError> {
    let start = Instant::now();

    let existing = store.node_count().await?;
    if existing > 0 {
        info!("Hierarchy already present ({} nodes), skipping build", existing);
        return Ok(BuildReport {
            skipped: true,
            ..BuildReport::default()
        });
    }

    info!(
        "Building hierarchy from '{}' (reference table version {})",
        extract_path.display(),
        reference.version()
    );
    let source_rows = sources::read_delimited(extract_path, EXTRACT_DELIMITER).map_err(|source| {
        BuildError::SourceUnavailable {
            path: extract_path.to_path_buf(),
            source,
        }
    })?;

    let mut errors = source_rows.unreadable;
    let mut builder = HierarchyBuilder::new(reference);
    for columns in &source_rows.rows {
        match MunicipalityRow::from_columns(columns) {
            Some(row) => builder.add_row(&row),
            None => errors += 1,
        }
    }
    let hierarchy = builder.finish();
    if errors > 0 {
        warn!("{} extract rows could not be parsed and were skipped", errors);
    }

    store.insert_hierarchy(hierarchy.nodes()).await?;

    let report = BuildReport {
        regions: hierarchy.count_level(NodeLevel::Region),
        districts: hierarchy.count_level(NodeLevel::District),
        municipalities: hierarchy.count_level(NodeLevel::Municipality),
        errors,
        orphaned_districts: hierarchy.orphaned_districts(),
        skipped: false,
    };
    info!(
        "Hierarchy built: {} regions, {} districts, {} municipalities in {:.2?}",
        report.regions,
        report.districts,
        report.municipalities,
        start.elapsed()
    );
    Ok(report)
}
