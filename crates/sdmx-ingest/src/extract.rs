//! Raw extraction of census Generic SDMX data documents.
//!
//! Walks a Generic data document with the streaming reader and emits a
//! coded CSV with the same data. Column names and cell values stay
//! exactly as they appear in the document; humanization is a separate
//! pass over the resulting file.
//!
//! Row assembly follows the shape of the Generic format: each `Value`
//! element contributes one (concept, coded value) pair to the current
//! observation, an `ObsValue` element closes the observation with the
//! measured value, and an `OBS_STATUS` value closes it with no measured
//! value at all (the observation was suppressed by the publisher).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Column header of the measured value.
pub const OBS_VALUE_COLUMN: &str = "OBS_VALUE";

/// Concept whose presence marks a suppressed observation.
pub const OBS_STATUS_CONCEPT: &str = "OBS_STATUS";

/// Counts reported after a completed extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractReport {
    pub rows: usize,
    pub columns: usize,
}

/// Extract a Generic SDMX data document on disk into a coded CSV.
pub fn extract_file(input: &Path, output: &Path) -> Result<ExtractReport> {
    let reader = File::open(input).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: input.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: input.to_path_buf(),
                source,
            }
        }
    })?;
    let writer = File::create(output).map_err(|source| IngestError::FileWrite {
        path: output.to_path_buf(),
        source,
    })?;
    let report = extract(BufReader::new(reader), BufWriter::new(writer), input)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = report.rows,
        "extracted data document"
    );
    Ok(report)
}

/// Extract Generic SDMX content from any reader into any writer.
///
/// `context` names the input in errors.
pub fn extract<R: BufRead, W: Write>(input: R, output: W, context: &Path) -> Result<ExtractReport> {
    let parse_error = |message: String| IngestError::DataParse {
        path: context.to_path_buf(),
        message,
    };

    let mut xml = Reader::from_reader(input);
    let mut buf = Vec::new();

    // First-seen column order; OBS_VALUE always goes last.
    let mut columns: Vec<String> = Vec::new();
    let mut row: HashMap<String, String> = HashMap::new();
    let mut rows: Vec<HashMap<String, String>> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(e.to_string()))?;
        match event {
            Event::Start(element) => {
                depth += 1;
                observe_element(&element, &mut columns, &mut row, &mut rows)
                    .map_err(&parse_error)?;
            }
            Event::Empty(element) => {
                observe_element(&element, &mut columns, &mut row, &mut rows)
                    .map_err(&parse_error)?;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_error("unexpected closing tag".to_string()))?;
            }
            Event::Eof => {
                if depth != 0 {
                    return Err(parse_error("unclosed element at end of document".to_string()));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    columns.push(OBS_VALUE_COLUMN.to_string());
    debug!(rows = rows.len(), columns = columns.len(), "assembled observations");

    let mut writer = csv::Writer::from_writer(output);
    let csv_error = |source| IngestError::Csv {
        path: context.to_path_buf(),
        source,
    };
    writer.write_record(&columns).map_err(csv_error)?;
    for row in &rows {
        let record: Vec<&str> = columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|source| csv_error(csv::Error::from(source)))?;

    Ok(ExtractReport {
        rows: rows.len(),
        columns: columns.len(),
    })
}

/// Fold one element into the row being assembled.
fn observe_element(
    element: &quick_xml::events::BytesStart<'_>,
    columns: &mut Vec<String>,
    row: &mut HashMap<String, String>,
    rows: &mut Vec<HashMap<String, String>>,
) -> std::result::Result<(), String> {
    match element.name().local_name().as_ref() {
        b"Value" => {
            let (concept, value) = concept_value_attributes(element)?;
            if !columns.contains(&concept) {
                columns.push(concept.clone());
            }
            let suppressed = concept == OBS_STATUS_CONCEPT;
            row.insert(concept, value);
            if suppressed {
                // No measured value follows; the row is done.
                rows.push(std::mem::take(row));
            }
        }
        b"ObsValue" => {
            let value = attribute(element, "value")?.unwrap_or_default();
            row.insert(OBS_VALUE_COLUMN.to_string(), value);
            rows.push(std::mem::take(row));
        }
        _ => {}
    }
    Ok(())
}

/// Read the `concept` and `value` attributes of a `Value` element.
fn concept_value_attributes(
    element: &quick_xml::events::BytesStart<'_>,
) -> std::result::Result<(String, String), String> {
    let concept = attribute(element, "concept")?
        .ok_or_else(|| "Value element without concept attribute".to_string())?;
    let value = attribute(element, "value")?
        .ok_or_else(|| format!("Value element for '{concept}' without value attribute"))?;
    Ok((concept, value))
}

fn attribute(
    element: &quick_xml::events::BytesStart<'_>,
    name: &str,
) -> std::result::Result<Option<String>, String> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        if attribute.key.as_ref() == name.as_bytes() {
            let value = attribute.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<message:MessageGroup xmlns:message="urn:sdmx:message" xmlns:generic="urn:sdmx:generic">
  <generic:DataSet>
    <generic:Series>
      <generic:SeriesKey>
        <generic:Value concept="GEO" value="01"/>
        <generic:Value concept="SEX" value="2"/>
      </generic:SeriesKey>
      <generic:Obs>
        <generic:ObsValue value="42.7"/>
      </generic:Obs>
    </generic:Series>
    <generic:Series>
      <generic:SeriesKey>
        <generic:Value concept="GEO" value="59"/>
        <generic:Value concept="SEX" value="3"/>
        <generic:Value concept="OBS_STATUS" value="x"/>
      </generic:SeriesKey>
    </generic:Series>
  </generic:DataSet>
</message:MessageGroup>
"#;

    fn run(xml: &str) -> (String, ExtractReport) {
        let mut output = Vec::new();
        let report = extract(xml.as_bytes(), &mut output, Path::new("test.xml")).unwrap();
        (String::from_utf8(output).unwrap(), report)
    }

    #[test]
    fn test_columns_in_first_seen_order() {
        let (output, report) = run(DATA_XML);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "GEO,SEX,OBS_STATUS,OBS_VALUE");
        assert_eq!(report.columns, 4);
        assert_eq!(report.rows, 2);
    }

    #[test]
    fn test_observed_and_suppressed_rows() {
        let (output, _) = run(DATA_XML);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "01,2,,42.7");
        assert_eq!(lines[2], "59,3,x,");
    }

    #[test]
    fn test_malformed_document() {
        let err = extract(
            "<DataSet><Obs>".as_bytes(),
            &mut Vec::new(),
            Path::new("test.xml"),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::DataParse { .. }));
    }

    #[test]
    fn test_value_without_concept() {
        let err = extract(
            r#"<DataSet><Value value="1"/></DataSet>"#.as_bytes(),
            &mut Vec::new(),
            Path::new("test.xml"),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::DataParse { .. }));
    }
}
