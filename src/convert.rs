//! The `convert` command: spreadsheet in, generated SQL out.

use anyhow::Result;
use log::info;

use crate::{cli::ConvertArgs, grid, io_utils, layout, statement, variant};

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let config = variant::resolve(&args.import)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Converting '{}' for table '{}' ({} layout)",
        args.input.display(),
        config.table,
        config.layout
    );

    let parsed = grid::load(&args.input, &config, args.delimiter, encoding)?;
    let extraction = layout::extract(&parsed, &config)?;
    let generated = statement::build(
        &config,
        &extraction.fields,
        &extraction.formatted,
        parsed.sheet_name(),
    );
    io_utils::write_sql_output(args.output.as_deref(), &generated.sql)?;

    info!(
        "Generated SQL for {} record(s) x {} field(s) from sheet '{}'",
        generated.record_count, generated.field_count, generated.sheet_name
    );
    Ok(())
}
