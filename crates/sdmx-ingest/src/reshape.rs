//! Tall-to-wide reshaping of humanized CSV files.
//!
//! Pivots a tall ("tidy") file into a wide one, mainly to save disk
//! space. The first two columns are the row index, the last column is
//! the value, and everything in between pivots into wide column names.
//! Values landing in the same (index, column) slot aggregate as their
//! mean.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::info;

use crate::error::{IngestError, Result};
use crate::table::CsvTable;

/// Column dropped before pivoting when present.
pub const MISSING_STATUS_COLUMN: &str = "Observation missing status";

/// Counts reported after a completed reshape.
#[derive(Debug, Clone, Copy)]
pub struct ReshapeReport {
    pub rows: usize,
    pub columns: usize,
}

/// Reshape a tall CSV file on disk into a wide one.
pub fn reshape_file(input: &Path, output: &Path) -> Result<ReshapeReport> {
    let mut table = CsvTable::from_path(input)?;

    if let Some(index) = table.column_index(MISSING_STATUS_COLUMN) {
        table.drop_column(index);
    }
    if table.headers.len() < 4 {
        return Err(IngestError::TooFewColumns {
            path: input.to_path_buf(),
            columns: table.headers.len(),
        });
    }

    let wide = pivot(&mut table);
    wide.write_to(output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = wide.rows.len(),
        columns = wide.headers.len(),
        "reshaped to wide format"
    );
    Ok(ReshapeReport {
        rows: wide.rows.len(),
        columns: wide.headers.len(),
    })
}

/// Pivot a tall table: two index columns, pivot columns in the middle,
/// value column last.
fn pivot(table: &mut CsvTable) -> CsvTable {
    // The second index column carries presentation indentation in census
    // outputs; trim it so equal labels group together.
    for row in &mut table.rows {
        row[1] = row[1].trim().to_string();
    }

    let value_index = table.headers.len() - 1;
    let mut wide_columns: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<(String, String), BTreeMap<String, MeanAccumulator>> = BTreeMap::new();

    for row in &table.rows {
        let key = (row[0].clone(), row[1].clone());
        let column = row[2..value_index]
            .iter()
            .map(|part| normalize_column(part))
            .collect::<Vec<String>>()
            .join("_")
            .trim()
            .to_string();
        wide_columns.insert(column.clone());
        let cell = cells.entry(key).or_default().entry(column).or_default();
        if let Ok(value) = row[value_index].trim().parse::<f64>() {
            cell.add(value);
        }
    }

    let mut headers = vec![
        normalize_column(&table.headers[0]),
        normalize_column(&table.headers[1]),
    ];
    headers.extend(wide_columns.iter().cloned());

    let rows = cells
        .into_iter()
        .map(|((first, second), row_cells)| {
            let mut row = vec![first, second];
            for column in &wide_columns {
                row.push(
                    row_cells
                        .get(column)
                        .and_then(MeanAccumulator::mean)
                        .map(format_value)
                        .unwrap_or_default(),
                );
            }
            row
        })
        .collect();

    CsvTable { headers, rows }
}

#[derive(Debug, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Normalize a column label into a compact slug.
fn normalize_column(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(" ($)", "")
        .replace('$', "")
        .replace("total - ", "all-")
        .replace(' ', "-")
        .replace(',', "")
}

fn format_value(mean: f64) -> String {
    if mean.fract() == 0.0 && mean.abs() < 1e15 {
        format!("{}", mean as i64)
    } else {
        mean.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_column() {
        assert_eq!(normalize_column("Total - Employed ($)"), "all-employed");
        assert_eq!(normalize_column("Age group"), "age-group");
        assert_eq!(normalize_column("  25 to 34 years, total  "), "25-to-34-years-total");
    }

    fn write_input(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("Generic_98-310.humanized.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_pivot_wide() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "Geography code,Age group,Sex,Value\n\
             01,   15 to 24 years,Male,10\n\
             01,   15 to 24 years,Female,14\n\
             59,25 to 34 years,Male,7\n",
        );
        let output = dir.path().join("out.csv");
        let report = reshape_file(&input, &output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "geography-code,age-group,female,male");
        assert_eq!(lines[1], "01,15 to 24 years,14,10");
        assert_eq!(lines[2], "59,25 to 34 years,,7");
        assert_eq!(report.rows, 2);
        assert_eq!(report.columns, 4);
    }

    #[test]
    fn test_mean_aggregation_and_missing_status_drop() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "Geography code,Age group,Sex,Observation missing status,Value\n\
             01,Total,Male,,10\n\
             01,Total,Male,,15\n\
             01,Total,Female,x,\n",
        );
        let output = dir.path().join("out.csv");
        reshape_file(&input, &output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "geography-code,age-group,female,male");
        assert_eq!(lines[1], "01,Total,,12.5");
    }

    #[test]
    fn test_too_few_columns() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "a,b,c\n1,2,3\n");
        let err = reshape_file(&input, &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, IngestError::TooFewColumns { columns: 3, .. }));
    }
}
