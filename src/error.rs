//! Error types for the ad analytics engine
//!
//! Every failure in the engine is per-request: none of these errors leaves the
//! metrics store or the catalog in an inconsistent state.

use crate::vector::VectorError;
use thiserror::Error;

/// The kind of catalog entity a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ad,
    Company,
    Category,
    Physician,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ad => "ad",
            Self::Company => "company",
            Self::Category => "category",
            Self::Physician => "physician",
        };
        f.write_str(name)
    }
}

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Unknown ad, company, category or physician, or an ad with no categories
    #[error("{kind} '{id}' not found: {reason}")]
    NotFound {
        kind: EntityKind,
        id: String,
        reason: &'static str,
    },

    /// The embedding or vector-index call failed
    #[error("Upstream {operation} failed: {source}")]
    UpstreamFailure {
        operation: &'static str,
        #[source]
        source: VectorError,
    },

    /// Caller supplied an invalid value
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl EngineError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>, reason: &'static str) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
            reason,
        }
    }

    pub(crate) fn upstream(operation: &'static str, source: VectorError) -> Self {
        Self::UpstreamFailure { operation, source }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Route handlers map these onto HTTP statuses or JSON error payloads.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::UpstreamFailure { .. } => "UPSTREAM_FAILURE",
            Self::Validation { .. } => "VALIDATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::NotFound { .. } => vec![
                "Check the identifier against the catalog listing",
                "Re-seed the vector indexes if the catalog changed since the last seed",
            ],
            Self::UpstreamFailure { .. } => vec![
                "The request was not retried; try again once the embedding service is reachable",
                "Verify the vector indexes have been seeded",
            ],
            Self::Validation { .. } => vec!["Correct the input value and resend the request"],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamFailure { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<VectorError> for EngineError {
    fn from(source: VectorError) -> Self {
        Self::upstream("vector boundary call", source)
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
