use super::TabularResult;

fn escape(val: &str) -> String {
    if val.contains(',') || val.contains('"') || val.contains('\n') {
        format!("\"{}\"", val.replace('"', "\"\""))
    } else {
        val.to_string()
    }
}

pub fn format(result: &TabularResult, no_headers: bool) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);

    if !no_headers {
        lines.push(result.columns.join(","));
    }

    for row in &result.rows {
        let escaped: Vec<String> = row.iter().map(|val| escape(val)).collect();
        lines.push(escaped.join(","));
    }

    lines.join("\n")
}
