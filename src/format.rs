//! Cell-to-literal conversion. `format` produces the SQL literal text
//! used by the statement builder; `decode` is its typed twin feeding the
//! submission payload. Both are total: every cell maps to something.

use std::fmt;

use chrono::{Days, NaiveDate};

use crate::{grid::Cell, record::Value};

/// Largest date serial we convert (9999-12-31 in the 1900 date system).
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// SQL literal produced for one cell; `Null` renders as the bare
/// keyword, `Literal` carries quoted/escaped text or a plain number.
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedValue {
    Null,
    Literal(String),
}

impl FormattedValue {
    pub fn as_sql(&self) -> &str {
        match self {
            FormattedValue::Null => "NULL",
            FormattedValue::Literal(text) => text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormattedValue::Null)
    }
}

impl fmt::Display for FormattedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Date-typed fields are recognized by name, not by position: any field
/// whose name contains "fecha" takes the date rules.
pub fn is_date_field(field: &str) -> bool {
    field.to_ascii_lowercase().contains("fecha")
}

/// Converts one raw cell into a SQL literal for the given target field.
///
/// Date-typed text passes through verbatim inside quotes, without
/// parsing or escaping; numeric cells on date fields are interpreted as
/// spreadsheet date serials and rendered `'YYYY-MM-DD'`.
pub fn format(cell: &Cell, field: &str) -> FormattedValue {
    match cell {
        Cell::Empty => FormattedValue::Null,
        Cell::Text(text) if text.is_empty() => FormattedValue::Null,
        Cell::Number(serial) if is_date_field(field) => {
            FormattedValue::Literal(format!("'{}'", serial_to_display(*serial)))
        }
        Cell::Text(text) if is_date_field(field) => FormattedValue::Literal(format!("'{text}'")),
        Cell::Number(number) => FormattedValue::Literal(display_number(*number)),
        Cell::Text(text) => {
            FormattedValue::Literal(format!("'{}'", text.replace('\'', "''")))
        }
    }
}

/// Typed twin of [`format`]: same routing, native targets. Date serials
/// decode to their `YYYY-MM-DD` text form so the remote store receives
/// ISO dates rather than serial numbers.
pub fn decode(cell: &Cell, field: &str) -> Value {
    match cell {
        Cell::Empty => Value::Null,
        Cell::Text(text) if text.is_empty() => Value::Null,
        Cell::Number(serial) if is_date_field(field) => Value::Text(serial_to_display(*serial)),
        Cell::Number(number) => Value::Number(*number),
        Cell::Text(text) => Value::Text(text.clone()),
    }
}

/// Renders a number the way the source spreadsheet displayed it: whole
/// values without a fractional part, everything else in shortest form.
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() <= MAX_INTEGRAL {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// Beyond 2^53 an f64 no longer holds exact integers.
const MAX_INTEGRAL: f64 = 9_007_199_254_740_992.0;

fn serial_to_display(serial: f64) -> String {
    match serial_to_date(serial) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => display_number(serial),
    }
}

// Excel 1900 date system: day 1 is 1900-01-01, counted from an epoch of
// 1899-12-30 to absorb the phantom 1900-02-29. Time-of-day fractions
// are truncated.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_DATE_SERIAL {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}
