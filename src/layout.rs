//! Layout readers: walk the parsed grid in the configured orientation
//! and emit, per logical record, both the SQL-literal row used by the
//! statement builder and the typed record used for submission.
//!
//! Binding is positional. Header labels (first row or first column) are
//! carried in the source for display only and never consulted here; a
//! reordered spreadsheet silently maps values to the wrong fields, and
//! that behavior is preserved for compatibility with existing imports.

use crate::{
    error::ImportError,
    format::{self, FormattedValue},
    grid::RawGrid,
    record::{Record, Value},
    variant::{ImportConfig, Layout},
};

/// Output of one layout pass: parallel formatted and typed views of the
/// same records, plus the effective field list (truncated in column
/// layout when the grid has fewer rows than configured fields).
#[derive(Debug)]
pub struct Extraction {
    pub fields: Vec<String>,
    pub formatted: Vec<Vec<FormattedValue>>,
    pub records: Vec<Record>,
}

pub fn extract(grid: &RawGrid, config: &ImportConfig) -> Result<Extraction, ImportError> {
    match config.layout {
        Layout::Row => extract_rows(grid, config),
        Layout::Column => extract_columns(grid, config),
    }
}

/// Row-per-record: the first row is a header, every later non-blank row
/// becomes one record. Cell `i` binds to field `i`.
fn extract_rows(grid: &RawGrid, config: &ImportConfig) -> Result<Extraction, ImportError> {
    if grid.row_count() < 2 {
        return Err(ImportError::validation(
            "The sheet needs a header row and at least one data row",
        ));
    }

    let fields = config.fields.clone();
    let mut formatted = Vec::new();
    let mut records = Vec::new();
    for row in 1..grid.row_count() {
        if grid.row_is_blank(row) {
            continue;
        }
        let (literals, entries) = read_record(grid, &fields, |index| (row, index));
        formatted.push(literals);
        records.push(Record::new(entries));
    }

    if records.is_empty() {
        return Err(ImportError::validation(
            "Every data row in the sheet is blank",
        ));
    }
    Ok(Extraction {
        fields,
        formatted,
        records,
    })
}

/// Column-per-record: column A holds labels, every later column becomes
/// one record — blank columns included, which yield all-NULL records.
/// Row `r` binds to field `r`.
fn extract_columns(grid: &RawGrid, config: &ImportConfig) -> Result<Extraction, ImportError> {
    if grid.column_count() < 2 {
        return Err(ImportError::validation(
            "The sheet needs a label column and at least one data column",
        ));
    }

    let depth = grid.row_count().min(config.fields.len());
    let fields = config.fields[..depth].to_vec();
    let mut formatted = Vec::new();
    let mut records = Vec::new();
    for column in 1..grid.column_count() {
        let (literals, entries) = read_record(grid, &fields, |index| (index, column));
        formatted.push(literals);
        records.push(Record::new(entries));
    }

    Ok(Extraction {
        fields,
        formatted,
        records,
    })
}

fn read_record(
    grid: &RawGrid,
    fields: &[String],
    position: impl Fn(usize) -> (usize, usize),
) -> (Vec<FormattedValue>, Vec<(String, Value)>) {
    let mut literals = Vec::with_capacity(fields.len());
    let mut entries = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let (row, column) = position(index);
        let cell = grid.cell(row, column);
        literals.push(format::format(cell, field));
        entries.push((field.clone(), format::decode(cell, field)));
    }
    (literals, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::record::Value;
    use crate::variant::{Domain, ImportConfig, Layout};

    fn config(layout: Layout, fields: &[&str]) -> ImportConfig {
        ImportConfig {
            table: "lecturas".to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            layout,
            domain: Domain::Water,
            extensions: vec!["xlsx".to_string()],
        }
    }

    fn number(value: f64) -> Cell {
        Cell::Number(value)
    }

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    #[test]
    fn row_layout_skips_blank_rows_and_binds_positionally() {
        let grid = RawGrid::new(
            "pozos",
            vec![
                vec![text("Fecha"), text("Pozo"), text("Caudal")],
                vec![number(44927.0), text("Norte"), number(12.5)],
                vec![Cell::Empty, text(""), Cell::Empty],
                vec![number(44928.0), text("Sur"), Cell::Empty],
            ],
        );
        let extraction = extract(&grid, &config(Layout::Row, &["fecha", "pozo", "caudal"]))
            .expect("row extraction");

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.formatted[0][0].as_sql(), "'2023-01-01'");
        assert_eq!(extraction.formatted[0][1].as_sql(), "'Norte'");
        assert_eq!(extraction.formatted[1][2].as_sql(), "NULL");
        assert_eq!(
            extraction.records[1].value("fecha"),
            Some(&Value::Text("2023-01-02".to_string()))
        );
    }

    #[test]
    fn row_layout_requires_a_data_row() {
        let grid = RawGrid::new("pozos", vec![vec![text("Fecha"), text("Pozo")]]);
        let err = extract(&grid, &config(Layout::Row, &["fecha", "pozo"])).expect_err("no rows");
        assert!(err.to_string().contains("at least one data row"));
    }

    #[test]
    fn row_layout_rejects_all_blank_data() {
        let grid = RawGrid::new(
            "pozos",
            vec![
                vec![text("Fecha"), text("Pozo")],
                vec![Cell::Empty, text("")],
            ],
        );
        let err = extract(&grid, &config(Layout::Row, &["fecha", "pozo"])).expect_err("all blank");
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let grid = RawGrid::new(
            "pozos",
            vec![
                vec![text("Fecha"), text("Pozo"), text("Caudal")],
                vec![number(44927.0)],
            ],
        );
        let extraction = extract(&grid, &config(Layout::Row, &["fecha", "pozo", "caudal"]))
            .expect("row extraction");
        assert_eq!(extraction.formatted[0].len(), 3);
        assert_eq!(extraction.formatted[0][1].as_sql(), "NULL");
        assert_eq!(extraction.formatted[0][2].as_sql(), "NULL");
    }

    #[test]
    fn column_layout_emits_one_record_per_data_column() {
        let grid = RawGrid::new(
            "consumo",
            vec![
                vec![text("Fecha"), number(44927.0), number(44958.0)],
                vec![text("Producción"), number(1500.0), number(1488.5)],
                vec![text("Consumo"), number(1320.0), Cell::Empty],
            ],
        );
        let extraction = extract(
            &grid,
            &config(Layout::Column, &["fecha", "produccion_m3", "consumo_m3"]),
        )
        .expect("column extraction");

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.fields.len(), 3);
        assert_eq!(extraction.formatted[0][0].as_sql(), "'2023-01-01'");
        assert_eq!(extraction.formatted[1][0].as_sql(), "'2023-02-01'");
        assert_eq!(extraction.formatted[1][2].as_sql(), "NULL");
    }

    #[test]
    fn column_layout_truncates_fields_to_grid_depth() {
        let grid = RawGrid::new(
            "consumo",
            vec![
                vec![text("Fecha"), number(44927.0)],
                vec![text("Producción"), number(1500.0)],
            ],
        );
        let extraction = extract(
            &grid,
            &config(
                Layout::Column,
                &["fecha", "produccion_m3", "consumo_m3", "perdidas_m3"],
            ),
        )
        .expect("column extraction");

        assert_eq!(extraction.fields, vec!["fecha", "produccion_m3"]);
        assert_eq!(extraction.records[0].len(), 2);
    }

    #[test]
    fn blank_columns_still_produce_all_null_records() {
        let grid = RawGrid::new(
            "consumo",
            vec![
                vec![text("Fecha"), Cell::Empty, number(44958.0)],
                vec![text("Producción"), Cell::Empty, number(1488.5)],
            ],
        );
        let extraction = extract(&grid, &config(Layout::Column, &["fecha", "produccion_m3"]))
            .expect("column extraction");

        assert_eq!(extraction.records.len(), 2);
        assert!(extraction.formatted[0].iter().all(FormattedValue::is_null));
        assert!(extraction.records[0].entries().iter().all(|(_, v)| v.is_null()));
    }

    #[test]
    fn column_layout_requires_a_data_column() {
        let grid = RawGrid::new("consumo", vec![vec![text("Fecha")], vec![text("Consumo")]]);
        let err = extract(&grid, &config(Layout::Column, &["fecha", "consumo_m3"]))
            .expect_err("one column only");
        assert!(err.to_string().contains("data column"));
    }
}
