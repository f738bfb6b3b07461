use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::Table;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Flatten a table into one normalized line of text.
///
/// Cells are written row by row without header or index columns, then every
/// whitespace run (newlines included) collapses to a single ASCII space.
pub fn table_to_text(table: &Table) -> String {
    let grid = table
        .rows
        .iter()
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    normalize_whitespace(&grid)
}

pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
