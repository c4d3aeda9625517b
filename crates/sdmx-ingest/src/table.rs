//! In-memory CSV tables for whole-file transforms.

use std::path::Path;

use crate::error::{IngestError, Result};

/// A fully loaded CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Load a CSV file into memory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| map_open_error(path, source))?;

        let headers = reader
            .headers()
            .map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(normalize_header)
            .collect::<Vec<String>>();
        if headers.is_empty() {
            return Err(IngestError::EmptyCsv {
                path: path.to_path_buf(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // Short records pad out so column indexing stays uniform.
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Write the table to disk.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let csv_error = |source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(&self.headers).map_err(csv_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer
            .flush()
            .map_err(|source| csv_error(csv::Error::from(source)))
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Drop a column by index from the headers and every row.
    pub fn drop_column(&mut self, index: usize) {
        self.headers.remove(index);
        for row in &mut self.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').to_string()
}

fn map_open_error(path: &Path, source: csv::Error) -> IngestError {
    if let csv::ErrorKind::Io(io) = source.kind()
        && io.kind() == std::io::ErrorKind::NotFound
    {
        return IngestError::FileNotFound {
            path: path.to_path_buf(),
        };
    }
    IngestError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "4,5").unwrap();
        file.flush().unwrap();

        let table = CsvTable::from_path(file.path()).unwrap();
        assert_eq!(table.headers, ["a", "b", "c"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], ["4", "5", ""]);
        assert_eq!(table.column_index("b"), Some(1));
    }

    #[test]
    fn test_drop_column() {
        let mut table = CsvTable {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec!["1".to_string(), "2".to_string()]],
        };
        table.drop_column(0);
        assert_eq!(table.headers, ["b"]);
        assert_eq!(table.rows[0], ["2"]);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvTable::from_path(Path::new("/nonexistent/input.csv")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }
}
