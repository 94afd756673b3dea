// src/resolution/engine.rs
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{NotFoundReason, ResolveError};
use crate::models::{Ancestor, IdentifierHit, NodeId, NodeLevel, SchemeTag};
use crate::store::GeoStore;
use crate::utils::constants::{
    FUZZY_RESULT_LIMIT, MIN_CONFIDENCE_PERCENT, REGISTRY_NUMBER_WIDTH, ROOT_NODE_MARKER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    ExactMatch,
    FuzzyMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub display_name: String,
    pub code_value: String,
    pub scheme: SchemeTag,
    pub node_level: NodeLevel,
    pub confidence: f64,
    pub confidence_label: String,
    pub ancestor_breadcrumb: String,
}

/// Answer to one query, in the shape callers serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub status: MatchStatus,
    /// Scheme the query was restricted to, or `all`.
    pub filter: String,
    pub count: usize,
    pub results: Vec<RankedResult>,
}

/// Values tried by the exact phase: the query as given, its trimmed form when
/// that differs, and the zero-padded registry-number form when the trimmed
/// query is a short run of digits.
pub fn exact_candidates(query: &str) -> Vec<String> {
    let trimmed = query.trim();
    let mut candidates = vec![query.to_string()];
    if trimmed != query {
        candidates.push(trimmed.to_string());
    }
    if !trimmed.is_empty()
        && trimmed.len() < REGISTRY_NUMBER_WIDTH
        && trimmed.chars().all(|c| c.is_ascii_digit())
    {
        candidates.push(format!(
            "{:0>width$}",
            trimmed,
            width = REGISTRY_NUMBER_WIDTH
        ));
    }
    candidates
}

/// `(1 - distance) * 100`, rounded to two decimals.
pub fn confidence_from_distance(distance: f64) -> f64 {
    ((1.0 - distance) * 100.0 * 100.0).round() / 100.0
}

pub fn confidence_label(confidence: f64) -> String {
    format!("{} %", confidence)
}

pub fn format_breadcrumb(ancestors: &[Ancestor]) -> String {
    if ancestors.is_empty() {
        return ROOT_NODE_MARKER.to_string();
    }
    ancestors
        .iter()
        .map(|a| format!("{} ({})", a.name, a.level))
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Resolves a code or name to ranked hierarchy nodes.
///
/// Exact matches short-circuit the similarity phase. Fails with `NotFound`
/// when nothing clears the confidence floor.
pub async fn resolve<S: GeoStore + ?Sized>(
    store: &S,
    query: &str,
    filter: Option<SchemeTag>,
) -> Result<Resolution, ResolveError> {
    let filter_label = filter.map_or_else(|| "all".to_string(), |s| s.to_string());

    let candidates = exact_candidates(query);
    let exact = store.exact_lookup(&candidates, filter).await?;
    if !exact.is_empty() {
        debug!("'{}' matched {} records exactly", query, exact.len());
        let scored = exact.into_iter().map(|hit| (hit, 100.0)).collect();
        let results = enrich(store, scored).await?;
        return Ok(Resolution {
            status: MatchStatus::ExactMatch,
            filter: filter_label,
            count: results.len(),
            results,
        });
    }

    let mut fuzzy = store
        .similarity_lookup(query.trim(), filter, FUZZY_RESULT_LIMIT)
        .await?;
    if fuzzy.is_empty() {
        return Err(ResolveError::NotFound {
            query: query.to_string(),
            reason: NotFoundReason::NoCandidates,
        });
    }
    fuzzy.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| b.hit.priority.cmp(&a.hit.priority))
            .then_with(|| a.hit.record_id.cmp(&b.hit.record_id))
    });
    fuzzy.truncate(FUZZY_RESULT_LIMIT);

    let kept: Vec<(IdentifierHit, f64)> = fuzzy
        .into_iter()
        .map(|s| {
            let confidence = confidence_from_distance(s.distance);
            (s.hit, confidence)
        })
        .filter(|(_, confidence)| *confidence >= MIN_CONFIDENCE_PERCENT)
        .collect();
    if kept.is_empty() {
        return Err(ResolveError::NotFound {
            query: query.to_string(),
            reason: NotFoundReason::BelowThreshold,
        });
    }

    let results = enrich(store, kept).await?;
    Ok(Resolution {
        status: MatchStatus::FuzzyMatch,
        filter: filter_label,
        count: results.len(),
        results,
    })
}

async fn enrich<S: GeoStore + ?Sized>(
    store: &S,
    scored: Vec<(IdentifierHit, f64)>,
) -> Result<Vec<RankedResult>, ResolveError> {
    let mut breadcrumbs: HashMap<Vec<NodeId>, String> = HashMap::new();
    let mut results = Vec::with_capacity(scored.len());

    for (hit, confidence) in scored {
        let breadcrumb = match breadcrumbs.get(&hit.node_path) {
            Some(b) => b.clone(),
            None => {
                let ancestors = store.ancestors(&hit.node_path).await?;
                let b = format_breadcrumb(&ancestors);
                breadcrumbs.insert(hit.node_path.clone(), b.clone());
                b
            }
        };
        results.push(RankedResult {
            display_name: hit.node_name,
            code_value: hit.value,
            scheme: hit.scheme,
            node_level: hit.node_level,
            confidence,
            confidence_label: confidence_label(confidence),
            ancestor_breadcrumb: breadcrumb,
        });
    }
    Ok(results)
}
