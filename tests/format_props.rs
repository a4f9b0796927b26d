use lecturas::format::{self, FormattedValue};
use lecturas::grid::Cell;
use proptest::prelude::*;

proptest! {
    #[test]
    fn non_date_numbers_pass_through_unquoted(value in -1.0e12f64..1.0e12f64) {
        let formatted = format::format(&Cell::Number(value), "consumo_m3");
        let sql = formatted.as_sql().to_string();
        prop_assert!(!sql.starts_with('\''));
        let reparsed: f64 = sql.parse().expect("numeric literal parses back");
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn text_always_quotes_and_doubles_apostrophes(value in ".*") {
        let formatted = format::format(&Cell::Text(value.clone()), "pozo");
        if value.is_empty() {
            prop_assert_eq!(formatted, FormattedValue::Null);
        } else {
            let sql = formatted.as_sql();
            prop_assert!(sql.starts_with('\'') && sql.ends_with('\''));
            let interior = &sql[1..sql.len() - 1];
            prop_assert_eq!(interior.replace("''", "'"), value);
        }
    }

    #[test]
    fn empty_cells_always_format_null(field in "[a-z_]{1,12}") {
        let empty = format::format(&Cell::Empty, &field);
        prop_assert_eq!(empty.as_sql(), "NULL");
        let empty_text = format::format(&Cell::Text(String::new()), &field);
        prop_assert_eq!(empty_text.as_sql(), "NULL");
    }

    #[test]
    fn date_serials_always_render_quoted_iso_dates(serial in 1.0f64..2_958_465.0f64) {
        let sql = format::format(&Cell::Number(serial), "fecha").as_sql().to_string();
        prop_assert!(sql.starts_with('\'') && sql.ends_with('\''));
        // YYYY-MM-DD shape: two dashes, zero-padded fields.
        let interior = &sql[1..sql.len() - 1];
        let parts: Vec<&str> = interior.split('-').collect();
        prop_assert_eq!(parts.len(), 3);
        prop_assert_eq!(parts[1].len(), 2);
        prop_assert_eq!(parts[2].len(), 2);
    }
}
