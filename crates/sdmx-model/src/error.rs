//! Error types for structure metadata loading and code resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a structure document or resolving codes.
#[derive(Debug, Error)]
pub enum SdmxError {
    // === Document Errors ===
    /// Structure document could not be read from disk.
    #[error("failed to read structure document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structure document is not well-formed XML.
    #[error("malformed structure document: {message}")]
    DocumentParse { message: String },

    // === Schema Errors ===
    /// No `PrimaryMeasure` element in the structure document.
    #[error("structure document declares no primary measure")]
    PrimaryMeasureMissing,

    /// A concept referenced in the key family has no `Concept` definition.
    #[error("concept '{code}' referenced in key family has no definition")]
    ConceptDefinitionMissing { code: String },

    /// A concept definition carries no `Name` child.
    #[error("concept '{code}' has no name")]
    ConceptNameMissing { code: String },

    /// The key family references the same concept code twice.
    #[error("duplicate concept '{code}' in key family")]
    DuplicateConceptCode { code: String },

    // === Query Errors ===
    /// Query for a concept code that was never discovered.
    #[error("unknown concept code '{code}'")]
    UnknownConceptCode { code: String },

    /// Query for a concept name that was never discovered.
    #[error("unknown concept name '{name}'")]
    UnknownConceptName { name: String },

    /// Query for a coded value absent from its concept's codelist.
    #[error("unknown value '{value}' for concept '{code}'")]
    UnknownCodeValue { code: String, value: String },
}

impl From<quick_xml::Error> for SdmxError {
    fn from(err: quick_xml::Error) -> Self {
        Self::DocumentParse {
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for SdmxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::DocumentParse {
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::escape::EscapeError> for SdmxError {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Self::DocumentParse {
            message: err.to_string(),
        }
    }
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, SdmxError>;
