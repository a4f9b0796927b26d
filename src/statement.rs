//! Assembles the final INSERT text from formatted value rows.
//!
//! Table and field names are interpolated verbatim: generated output
//! must match the statements the legacy importer produced, including
//! its lack of identifier quoting. Literal values are the only escaped
//! part of the text.

use itertools::Itertools;

use crate::{
    format::{self, FormattedValue},
    variant::{ImportConfig, Layout},
};

/// Generated SQL text plus the summary shown to the user.
#[derive(Debug)]
pub struct GeneratedStatement {
    pub sql: String,
    pub record_count: usize,
    pub field_count: usize,
    pub sheet_name: String,
}

/// Builds the statement text for one conversion.
///
/// Column layout emits a single multi-row INSERT; row layout emits one
/// statement per record, blank-line separated, inside a transaction.
/// Wastewater imports add an upsert clause keyed on the date field.
pub fn build(
    config: &ImportConfig,
    fields: &[String],
    rows: &[Vec<FormattedValue>],
    sheet_name: &str,
) -> GeneratedStatement {
    let field_list = fields.iter().join(", ");
    let sql = match config.layout {
        Layout::Column => {
            let tuples = rows.iter().map(|row| tuple(row)).join(",\n");
            format!(
                "INSERT INTO {} ({}) VALUES\n{};",
                config.table, field_list, tuples
            )
        }
        Layout::Row => {
            let conflict = conflict_clause(config, fields);
            let statements = rows
                .iter()
                .map(|row| match &conflict {
                    Some(clause) => format!(
                        "INSERT INTO {} ({}) VALUES {} {};",
                        config.table,
                        field_list,
                        tuple(row),
                        clause
                    ),
                    None => format!(
                        "INSERT INTO {} ({}) VALUES {};",
                        config.table,
                        field_list,
                        tuple(row)
                    ),
                })
                .join("\n\n");
            format!("BEGIN;\n\n{statements}\n\nCOMMIT;")
        }
    };

    GeneratedStatement {
        sql,
        record_count: rows.len(),
        field_count: fields.len(),
        sheet_name: sheet_name.to_string(),
    }
}

fn tuple(row: &[FormattedValue]) -> String {
    format!("({})", row.iter().map(FormattedValue::as_sql).join(", "))
}

// Upserts key on the first date field; every other field is replaced
// from the incoming row. Without a date field there is no usable
// conflict target and the clause is omitted.
fn conflict_clause(config: &ImportConfig, fields: &[String]) -> Option<String> {
    if !config.upsert() {
        return None;
    }
    let key = fields.iter().find(|field| format::is_date_field(field))?;
    let updates = fields
        .iter()
        .filter(|field| *field != key)
        .map(|field| format!("{field} = EXCLUDED.{field}"))
        .join(", ");
    if updates.is_empty() {
        return None;
    }
    Some(format!("ON CONFLICT ({key}) DO UPDATE SET {updates}"))
}
