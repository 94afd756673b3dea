// src/error.rs
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a hierarchy build step.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source extract '{}' is unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference table '{}' is invalid: {reason}", path.display())]
    InvalidReference { path: PathBuf, reason: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Failures that abort a single fusion pass. Other passes still run.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("[{pass}] source extract '{}' is unavailable: {source}", path.display())]
    SourceUnavailable {
        pass: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{pass}] could not write unmatched report '{}': {source}", path.display())]
    Report {
        pass: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Neither phase produced a single candidate.
    NoCandidates,
    /// The similarity phase had candidates, all under the confidence floor.
    BelowThreshold,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoCandidates => f.write_str("Nothing found."),
            NotFoundReason::BelowThreshold => f.write_str("Nothing similar enough found."),
        }
    }
}

/// Terminal per-query failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{reason}")]
    NotFound { query: String, reason: NotFoundReason },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
