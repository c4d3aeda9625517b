//! File discovery via the catalogue naming convention.
//!
//! Census publications ship as file pairs named after a catalogue number:
//! the coded data file `Generic_CATALOG-NUM.csv` (or the raw SDMX data
//! document `Generic_CATALOG-NUM.xml`) next to its structure file
//! `Structure_CATALOG-NUM.xml`.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// File-name prefix of data files.
pub const DATA_PREFIX: &str = "Generic_";
/// File-name prefix of structure files.
pub const STRUCTURE_PREFIX: &str = "Structure_";

/// Resolved paths for one catalogued dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// The coded data file (`Generic_CATALOG-NUM.csv`).
    pub data: PathBuf,
    /// The sibling structure file (`Structure_CATALOG-NUM.xml`).
    pub structure: PathBuf,
    /// Default humanized output (`Generic_CATALOG-NUM.humanized.csv`).
    pub output: PathBuf,
    /// Catalogue number extracted from the data file name.
    pub catalogue: String,
}

impl DatasetPaths {
    /// Resolve the structure and output paths for a coded data file.
    ///
    /// The data file must be named `Generic_CATALOG-NUM.csv`; anything
    /// else is a [`IngestError::CatalogueNumber`] error.
    pub fn from_data_file(path: &Path) -> Result<Self> {
        let name = path.file_name().and_then(|v| v.to_str()).unwrap_or("");
        let catalogue = name
            .strip_prefix(DATA_PREFIX)
            .and_then(|rest| rest.strip_suffix(".csv"))
            .filter(|catalogue| !catalogue.is_empty())
            .ok_or_else(|| IngestError::CatalogueNumber {
                path: path.to_path_buf(),
            })?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            data: path.to_path_buf(),
            structure: dir.join(format!("{STRUCTURE_PREFIX}{catalogue}.xml")),
            output: dir.join(format!("{DATA_PREFIX}{catalogue}.humanized.csv")),
            catalogue: catalogue.to_string(),
        })
    }
}

/// Output path for raw extraction: `Generic_X.xml` becomes `Generic_X.csv`.
pub fn extracted_output_path(data_file: &Path) -> PathBuf {
    data_file.with_extension("csv")
}

/// Output path for reshaping: `X.csv` becomes `X.pivoted.csv`.
pub fn pivoted_output_path(csv_file: &Path) -> PathBuf {
    csv_file.with_extension("pivoted.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_paths_from_data_file() {
        let paths =
            DatasetPaths::from_data_file(Path::new("/data/Generic_98-400-X2016110.csv")).unwrap();
        assert_eq!(paths.catalogue, "98-400-X2016110");
        assert_eq!(
            paths.structure,
            PathBuf::from("/data/Structure_98-400-X2016110.xml")
        );
        assert_eq!(
            paths.output,
            PathBuf::from("/data/Generic_98-400-X2016110.humanized.csv")
        );
    }

    #[test]
    fn test_nonconforming_names_rejected() {
        for name in [
            "/data/Structure_98-400-X2016110.xml",
            "/data/Generic_98-400-X2016110.xml",
            "/data/Generic_.csv",
            "/data/table.csv",
        ] {
            assert!(matches!(
                DatasetPaths::from_data_file(Path::new(name)),
                Err(IngestError::CatalogueNumber { .. })
            ));
        }
    }

    #[test]
    fn test_output_path_helpers() {
        assert_eq!(
            extracted_output_path(Path::new("/data/Generic_98-310.xml")),
            PathBuf::from("/data/Generic_98-310.csv")
        );
        assert_eq!(
            pivoted_output_path(Path::new("/data/Generic_98-310.humanized.csv")),
            PathBuf::from("/data/Generic_98-310.humanized.pivoted.csv")
        );
    }
}
