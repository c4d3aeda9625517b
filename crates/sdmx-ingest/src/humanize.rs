//! Humanizing rewriter for coded CSV files.
//!
//! Rewrites a coded data file (headers are concept codes, cells are coded
//! values) into a readable one: headers become concept names and every
//! cell is expanded through the structure metadata. The raw geography
//! identifier is additionally retained in a leading `Geography code`
//! column so rows stay joinable on it after humanization.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use sdmx_model::StructureMetadata;

use crate::error::{IngestError, Result};

/// Header of the retained raw-geography column.
pub const GEOGRAPHY_CODE_HEADER: &str = "Geography code";

/// Concept code of the geography identifier in census data files.
pub const GEOGRAPHY_CONCEPT: &str = "GEO";

/// Options for the humanizing rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanizeOptions {
    /// Strip presentation indentation from resolved descriptions.
    pub trim_descriptions: bool,
}

/// Counts reported after a completed rewrite.
#[derive(Debug, Clone, Copy)]
pub struct HumanizeReport {
    pub rows: usize,
    pub columns: usize,
}

/// Humanize a coded CSV file on disk.
pub fn humanize_file(
    metadata: &StructureMetadata,
    input: &Path,
    output: &Path,
    options: HumanizeOptions,
) -> Result<HumanizeReport> {
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
    let report = humanize(
        metadata,
        BufReader::new(reader),
        BufWriter::new(writer),
        options,
        input,
    )?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = report.rows,
        "humanized data file"
    );
    Ok(report)
}

/// Humanize coded CSV content from any reader into any writer.
///
/// `context` names the input in errors.
pub fn humanize<R: Read, W: Write>(
    metadata: &StructureMetadata,
    input: R,
    output: W,
    options: HumanizeOptions,
    context: &Path,
) -> Result<HumanizeReport> {
    let csv_error = |source| IngestError::Csv {
        path: context.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    let codes: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').to_string())
        .collect();
    if codes.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: context.to_path_buf(),
        });
    }
    let geography_column = codes.iter().position(|code| code == GEOGRAPHY_CONCEPT);

    let mut headers: Vec<String> = Vec::with_capacity(codes.len() + 1);
    if geography_column.is_some() {
        headers.push(GEOGRAPHY_CODE_HEADER.to_string());
    }
    for code in &codes {
        headers.push(metadata.name_by_code(code)?.to_string());
    }
    debug!(columns = headers.len(), "resolved column headers");

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&headers).map_err(csv_error)?;

    let mut rows = 0usize;
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record).map_err(csv_error)? {
        let mut row: Vec<String> = Vec::with_capacity(headers.len());
        if let Some(index) = geography_column {
            row.push(record.get(index).unwrap_or("").to_string());
        }
        for (code, value) in codes.iter().zip(record.iter()) {
            row.push(metadata.description_by_code_level(
                code,
                value,
                options.trim_descriptions,
            )?);
        }
        writer.write_record(&row).map_err(csv_error)?;
        rows += 1;
    }
    writer
        .flush()
        .map_err(|source| csv_error(csv::Error::from(source)))?;

    Ok(HumanizeReport {
        rows,
        columns: headers.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdmx_model::StructureDocument;

    fn metadata() -> StructureMetadata {
        let document = StructureDocument::parse_str(
            r#"<Structure>
                 <Concept id="GEO"><Name>Geography</Name></Concept>
                 <Concept id="SEX"><Name>Sex</Name></Concept>
                 <Concept id="OBS_VALUE"><Name>Value</Name></Concept>
                 <CodeList id="CL_GEO">
                   <Code value="01"><Description>Canada</Description></Code>
                 </CodeList>
                 <CodeList id="CL_SEX">
                   <Code value="1"><Description>Total</Description></Code>
                   <Code value="2"><Description>Male</Description></Code>
                 </CodeList>
                 <KeyFamily>
                   <Dimension conceptRef="GEO" codelist="CL_GEO"/>
                   <Dimension conceptRef="SEX" codelist="CL_SEX"/>
                   <PrimaryMeasure conceptRef="OBS_VALUE"/>
                 </KeyFamily>
               </Structure>"#,
        )
        .unwrap();
        StructureMetadata::from_document(&document).unwrap()
    }

    fn run(input: &str, options: HumanizeOptions) -> (String, HumanizeReport) {
        let mut output = Vec::new();
        let report = humanize(
            &metadata(),
            input.as_bytes(),
            &mut output,
            options,
            Path::new("test.csv"),
        )
        .unwrap();
        (String::from_utf8(output).unwrap(), report)
    }

    #[test]
    fn test_headers_and_cells_humanized() {
        let (output, report) = run(
            "GEO,SEX,OBS_VALUE\n01,2,42.7\n01,1,100\n",
            HumanizeOptions::default(),
        );
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Geography code,Geography,Sex,Value");
        assert_eq!(lines[1], "01,Canada,Male,42.7");
        assert_eq!(lines[2], "01,Canada,Total,100");
        assert_eq!(report.rows, 2);
        assert_eq!(report.columns, 4);
    }

    #[test]
    fn test_suppressed_cells_stay_empty() {
        let (output, _) = run("GEO,SEX,OBS_VALUE\n01,2,\n", HumanizeOptions::default());
        assert_eq!(output.lines().nth(1).unwrap(), "01,Canada,Male,");
    }

    #[test]
    fn test_no_geography_column() {
        let (output, _) = run("SEX,OBS_VALUE\n1,5\n", HumanizeOptions::default());
        assert_eq!(output.lines().next().unwrap(), "Sex,Value");
        assert_eq!(output.lines().nth(1).unwrap(), "Total,5");
    }

    #[test]
    fn test_unknown_cell_value_propagates() {
        let err = humanize(
            &metadata(),
            "GEO,SEX,OBS_VALUE\n01,9,5\n".as_bytes(),
            &mut Vec::new(),
            HumanizeOptions::default(),
            Path::new("test.csv"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Metadata(sdmx_model::SdmxError::UnknownCodeValue { .. })
        ));
    }

    #[test]
    fn test_unknown_header_propagates() {
        let err = humanize(
            &metadata(),
            "POW,OBS_VALUE\n1,5\n".as_bytes(),
            &mut Vec::new(),
            HumanizeOptions::default(),
            Path::new("test.csv"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Metadata(sdmx_model::SdmxError::UnknownConceptCode { .. })
        ));
    }
}
