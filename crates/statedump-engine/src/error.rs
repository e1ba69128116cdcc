//! Fatal error surface for the dump engine.
//!
//! Every error aborts the dump immediately; nothing is recovered locally.
//! Each variant carries the selector it arose at so callers can point the
//! operator at the offending path in the dump spec or heap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DumpErrorKind — stable machine-readable codes
// ---------------------------------------------------------------------------

/// Coarse error class with a stable code string for event correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DumpErrorKind {
    /// Malformed or contradictory dump spec.
    Config,
    /// Heap traversal hit something the path cannot pass through.
    Structure,
    /// A value could not be rendered as an expression.
    Serializer,
    /// Cross-file reference discipline was violated.
    Ordering,
}

impl DumpErrorKind {
    /// Stable code string, fixed across releases.
    pub fn code(self) -> &'static str {
        match self {
            Self::Config => "SD-CONFIG",
            Self::Structure => "SD-STRUCT",
            Self::Serializer => "SD-SERIAL",
            Self::Ordering => "SD-ORDER",
        }
    }
}

// ---------------------------------------------------------------------------
// DumpError
// ---------------------------------------------------------------------------

/// Fatal dump failure: kind, offending selector, human detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    #[error("config error at '{selector}': {detail}")]
    Config { selector: String, detail: String },

    #[error("structure error at '{selector}': {detail}")]
    Structure { selector: String, detail: String },

    #[error("serializer error at '{selector}': {detail}")]
    Serializer { selector: String, detail: String },

    #[error("ordering error at '{selector}': {detail}")]
    Ordering { selector: String, detail: String },
}

impl DumpError {
    pub fn config(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Config {
            selector: selector.into(),
            detail: detail.into(),
        }
    }

    pub fn structure(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Structure {
            selector: selector.into(),
            detail: detail.into(),
        }
    }

    pub fn serializer(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Serializer {
            selector: selector.into(),
            detail: detail.into(),
        }
    }

    pub fn ordering(selector: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Ordering {
            selector: selector.into(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> DumpErrorKind {
        match self {
            Self::Config { .. } => DumpErrorKind::Config,
            Self::Structure { .. } => DumpErrorKind::Structure,
            Self::Serializer { .. } => DumpErrorKind::Serializer,
            Self::Ordering { .. } => DumpErrorKind::Ordering,
        }
    }

    /// The selector the error arose at.
    pub fn selector(&self) -> &str {
        match self {
            Self::Config { selector, .. }
            | Self::Structure { selector, .. }
            | Self::Serializer { selector, .. }
            | Self::Ordering { selector, .. } => selector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DumpErrorKind::Config.code(), "SD-CONFIG");
        assert_eq!(DumpErrorKind::Structure.code(), "SD-STRUCT");
        assert_eq!(DumpErrorKind::Serializer.code(), "SD-SERIAL");
        assert_eq!(DumpErrorKind::Ordering.code(), "SD-ORDER");
    }

    #[test]
    fn display_includes_selector_and_detail() {
        let err = DumpError::structure("$.util.cmd", "traversal through a primitive");
        assert_eq!(
            err.to_string(),
            "structure error at '$.util.cmd': traversal through a primitive"
        );
        assert_eq!(err.kind(), DumpErrorKind::Structure);
        assert_eq!(err.selector(), "$.util.cmd");
    }
}
