use std::borrow::Cow;

use comfy_table::{presets::ASCII_BORDERS_ONLY_CONDENSED, Table};

use super::TabularResult;

/// Display names can be long free text
const MAX_CELL_WIDTH: usize = 60;

fn truncate_value(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", truncated))
    }
}

pub fn format(result: &TabularResult, no_headers: bool) -> String {
    if result.rows.is_empty() {
        return "(0 rows)".to_string();
    }

    let mut table = Table::new();
    table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);

    if !no_headers {
        table.set_header(&result.columns);
    }

    for row in &result.rows {
        let cells: Vec<Cow<'_, str>> = row
            .iter()
            .map(|val| truncate_value(val, MAX_CELL_WIDTH))
            .collect();
        table.add_row(cells);
    }

    format!("{}\n({} rows)", table, result.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_value_short() {
        let result = truncate_value("hello", 10);
        assert_eq!(result, "hello");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_truncate_value_unicode() {
        let result = truncate_value("日本語テストです長い文字列", 8);
        assert!(result.chars().count() <= 8);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let result = TabularResult {
            columns: vec!["name".to_string()],
            rows: vec![vec!["a".repeat(80)]],
        };
        let output = format(&result, true);
        assert!(!output.contains(&"a".repeat(80)));
        assert!(output.contains("..."));
    }
}
