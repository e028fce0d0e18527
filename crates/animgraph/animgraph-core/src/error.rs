//! Error types shared across the codec, asset store and import pipelines.
//!
//! Structural defects in a document are never errors here: they surface as
//! validator diagnostics (see [`crate::validate`]) or as per-item
//! [`crate::materialize::MaterializeWarning`]s.

use thiserror::Error;

/// Hard failures of a single decode/encode call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("transition json parse error: {0}")]
    Parse(String),
    #[error("serialize transition document: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Parse(err.to_string())
    }
}

/// Failures reported by an [`crate::store::AssetStore`] implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset store io: {0}")]
    Io(String),
}

/// Errors produced by the import/export pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The document produced validator diagnostics and the configuration
    /// requires a clean document before import.
    #[error("document rejected with {} diagnostic(s)", diagnostics.len())]
    Rejected { diagnostics: Vec<String> },
}

impl PipelineError {
    /// Diagnostics attached to a rejected import, empty for other variants.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            PipelineError::Rejected { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_errors_map_to_parse() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let codec: CodecError = err.into();
        assert!(matches!(codec, CodecError::Parse(_)));
        assert!(codec.to_string().starts_with("transition json parse error"));
    }

    #[test]
    fn rejected_reports_count() {
        let err = PipelineError::Rejected {
            diagnostics: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "document rejected with 2 diagnostic(s)");
        assert_eq!(err.diagnostics().len(), 2);

        let store: PipelineError = StoreError::NotFound("x.json".into()).into();
        assert!(store.diagnostics().is_empty());
        assert_eq!(store.to_string(), "asset not found: x.json");
    }
}
