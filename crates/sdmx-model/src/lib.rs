//! SDMX structure metadata model.
//!
//! Loads an SDMX Structure document and derives the lookup tables a CSV
//! rewriter needs to expand coded census data into readable text: concept
//! code → variable name, and concept code + coded value → description.

pub mod error;
pub mod metadata;
pub mod structure;

pub use error::{Result, SdmxError};
pub use metadata::{CodeLevels, Concept, StructureMetadata};
pub use structure::{Element, StructureDocument};
