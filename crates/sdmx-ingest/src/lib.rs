//! SDMX data ingestion.
//!
//! The file-handling half of the toolkit: locating the structure file
//! that pairs with a coded data file, rewriting coded CSV data into
//! readable text through [`sdmx_model::StructureMetadata`], extracting a
//! raw Generic SDMX data document into a coded CSV, and reshaping tall
//! output into a wide layout.

pub mod discovery;
pub mod error;
pub mod extract;
pub mod humanize;
pub mod reshape;
pub mod table;

pub use discovery::{DatasetPaths, extracted_output_path, pivoted_output_path};
pub use error::{IngestError, Result};
pub use extract::{ExtractReport, extract, extract_file};
pub use humanize::{HumanizeOptions, HumanizeReport, humanize, humanize_file};
pub use reshape::{ReshapeReport, reshape_file};
pub use table::CsvTable;
