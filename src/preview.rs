//! The `preview` command: shows the decoded records as an aligned text
//! table so the operator can sanity-check field binding before
//! generating SQL or submitting anything.

use std::fmt::Write as _;

use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, grid, io_utils, layout, variant};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = variant::resolve(&args.import)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let parsed = grid::load(&args.input, &config, args.delimiter, encoding)?;
    let extraction = layout::extract(&parsed, &config)?;

    let rows: Vec<Vec<String>> = extraction
        .records
        .iter()
        .take(args.rows)
        .map(|record| {
            record
                .entries()
                .iter()
                .map(|(_, value)| value.as_display())
                .collect()
        })
        .collect();
    print!("{}", render_table(&extraction.fields, &rows));

    info!(
        "Displayed {} of {} record(s) from sheet '{}'",
        rows.len(),
        extraction.records.len(),
        parsed.sheet_name()
    );
    Ok(())
}

/// Plain-text table: headers, a dashed separator, then space-padded
/// cells. Column widths grow to the widest value.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_row(&mut output, headers, &widths);
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(1))).collect();
    push_row(&mut output, &dashes, &widths);
    for row in rows {
        push_row(&mut output, row, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (index, width) in widths.iter().enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(index).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        let padding = width.saturating_sub(cell.chars().count());
        line.push_str(&" ".repeat(padding));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}
