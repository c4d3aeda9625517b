//! Subcommand implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::info_span;

use sdmx_ingest::{
    DatasetPaths, HumanizeOptions, extract_file, extracted_output_path, humanize_file,
    pivoted_output_path, reshape_file,
};
use sdmx_model::StructureMetadata;

use crate::cli::{ConceptsArgs, ConceptsFormatArg, ExtractArgs, HumanizeArgs, ReshapeArgs};

pub fn run_humanize(args: &HumanizeArgs) -> Result<()> {
    let span = info_span!("humanize", data = %args.data_file.display());
    let _guard = span.enter();

    let (structure, output) = resolve_humanize_paths(args)?;
    let metadata = StructureMetadata::from_path(&structure)
        .with_context(|| format!("load structure {}", structure.display()))?;
    let options = HumanizeOptions {
        trim_descriptions: args.trim,
    };
    let report = humanize_file(&metadata, &args.data_file, &output, options)
        .with_context(|| format!("humanize {}", args.data_file.display()))?;

    println!("Humanized: {}", output.display());
    println!("Rows: {}  Columns: {}", report.rows, report.columns);
    Ok(())
}

/// Resolve the structure and output paths, preferring explicit flags
/// over the catalogue naming convention.
fn resolve_humanize_paths(args: &HumanizeArgs) -> Result<(PathBuf, PathBuf)> {
    if let (Some(structure), Some(output)) = (&args.structure, &args.output) {
        return Ok((structure.clone(), output.clone()));
    }
    let paths = DatasetPaths::from_data_file(&args.data_file)?;
    Ok((
        args.structure.clone().unwrap_or(paths.structure),
        args.output.clone().unwrap_or(paths.output),
    ))
}

pub fn run_extract(args: &ExtractArgs) -> Result<()> {
    let span = info_span!("extract", data = %args.data_file.display());
    let _guard = span.enter();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| extracted_output_path(&args.data_file));
    let report = extract_file(&args.data_file, &output)
        .with_context(|| format!("extract {}", args.data_file.display()))?;

    println!("Extracted: {}", output.display());
    println!("Rows: {}  Columns: {}", report.rows, report.columns);
    Ok(())
}

pub fn run_reshape(args: &ReshapeArgs) -> Result<()> {
    let span = info_span!("reshape", data = %args.csv_file.display());
    let _guard = span.enter();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| pivoted_output_path(&args.csv_file));
    let report = reshape_file(&args.csv_file, &output)
        .with_context(|| format!("reshape {}", args.csv_file.display()))?;

    println!("Reshaped: {}", output.display());
    println!("Rows: {}  Columns: {}", report.rows, report.columns);
    Ok(())
}

pub fn run_concepts(args: &ConceptsArgs) -> Result<()> {
    let metadata = StructureMetadata::from_path(&args.structure_file)
        .with_context(|| format!("load structure {}", args.structure_file.display()))?;

    match args.format {
        ConceptsFormatArg::Json => print_concepts_json(&metadata)?,
        ConceptsFormatArg::Table => print_concepts_table(&metadata),
    }
    Ok(())
}

fn print_concepts_json(metadata: &StructureMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata.concepts()).context("serialize concepts")?;
    println!("{json}");
    Ok(())
}

fn print_concepts_table(metadata: &StructureMetadata) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Name"),
        header_cell("Codelist"),
        header_cell("Levels"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);

    for concept in metadata.concepts() {
        let levels = metadata
            .code_levels()
            .get(&concept.code)
            .map(|levels| levels.len().to_string())
            .unwrap_or_else(|| "-".to_string());
        let name = if metadata.is_primary_measure(&concept.code) {
            Cell::new(format!("{} (primary measure)", concept.name)).fg(Color::Cyan)
        } else {
            Cell::new(&concept.name)
        };
        table.add_row(vec![
            Cell::new(&concept.code),
            name,
            Cell::new(concept.codelist_key.as_deref().unwrap_or("-")),
            Cell::new(levels),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
