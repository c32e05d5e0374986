//! Plain-text formatting helpers for table output.

use fredboard_core::cache::CachedSeries;
use fredboard_core::models::SavedMetric;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional value with two decimals, or a placeholder
pub fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_group(group: &str) -> &str {
    if group.is_empty() {
        "-"
    } else {
        group
    }
}

/// Left-aligned columns separated by two spaces.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(self.headers.as_slice());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&line(rule.as_slice()));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row.as_slice()));
        }
        out
    }
}

/// One row of `fredboard list`.
pub fn metric_row(metric: &SavedMetric, data: Option<&CachedSeries>) -> Vec<String> {
    let (latest, age) = match data {
        Some(cached) => {
            let latest = cached
                .data
                .present()
                .last()
                .map(|(date, v)| format!("{:.2} ({})", v, date))
                .unwrap_or_else(|| "N/A".to_string());
            (latest, cached.age_display())
        }
        None => ("-".to_string(), "never".to_string()),
    };
    let pref = &metric.preference;
    vec![
        metric.series_id.to_string(),
        truncate_string(metric.display_name(), 40),
        format_group(&pref.group).to_string(),
        pref.color.clone(),
        pref.line_style.to_string(),
        pref.thickness.to_string(),
        latest,
        age,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(3.14159)), "3.14");
        assert_eq!(format_value(None), "N/A");
    }

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(&["ID", "Value"]);
        table.push(vec!["UNRATE".to_string(), "3.9".to_string()]);
        table.push(vec!["GDP".to_string(), "28000.12".to_string()]);
        let rendered = table.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "ID      Value");
        assert_eq!(lines[1], "------  --------");
        assert_eq!(lines[2], "UNRATE  3.9");
        assert_eq!(lines[3], "GDP     28000.12");
    }
}
