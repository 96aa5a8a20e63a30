//! Decimal rendering at the table boundary. Metrics stay `f64` everywhere
//! else; only cells use the comma-decimal convention of the existing
//! benchmark tables.

use serde::{Deserialize, Serialize};

use crate::domain::MetricKind;

pub const NOT_AVAILABLE: &str = "N/A";

const METRIC_PLACES: usize = 2;
const RMSD_PLACES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
    #[serde(default = "default_rmsd_separator")]
    pub rmsd_decimal_separator: char,
    #[serde(default = "default_not_available")]
    pub not_available: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: default_decimal_separator(),
            rmsd_decimal_separator: default_rmsd_separator(),
            not_available: default_not_available(),
        }
    }
}

impl NumberFormat {
    /// Cell text for a metric value. Missing tool-reported values become the
    /// not-available marker; a missing RMSD leaves the cell empty.
    pub fn render_cell(&self, metric: MetricKind, value: Option<f64>) -> String {
        match value.filter(|v| v.is_finite()) {
            Some(value) if metric == MetricKind::Rmsd => {
                format_decimal(value, RMSD_PLACES, self.rmsd_decimal_separator, false)
            }
            Some(value) => format_decimal(value, METRIC_PLACES, self.decimal_separator, true),
            None if metric.is_tool_reported() => self.not_available.clone(),
            None => String::new(),
        }
    }

    /// Reads back a cell written by [`render_cell`](Self::render_cell) with
    /// this format. Empty cells, the not-available marker and non-finite
    /// values are `None`. Ungrouped cells in the other decimal convention
    /// are accepted as well.
    pub fn parse_cell(&self, metric: MetricKind, cell: &str) -> Option<f64> {
        let trimmed = cell.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(&self.not_available)
            || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE)
            || trimmed.eq_ignore_ascii_case("nan")
        {
            return None;
        }
        let (separator, grouped) = if metric == MetricKind::Rmsd {
            (self.rmsd_decimal_separator, false)
        } else {
            (self.decimal_separator, true)
        };
        parse_decimal(trimmed, separator, grouped)
    }

    /// Display form used in progress lines.
    pub fn render_display(&self, metric: MetricKind, value: Option<f64>) -> String {
        let text = self.render_cell(metric, value);
        if text.is_empty() {
            self.not_available.clone()
        } else {
            text
        }
    }
}

/// Fixed-point rendering with `separator` as decimal mark. With `grouped`
/// the integer part gets thousands grouping using the opposite mark
/// (`1234.5` -> `1.234,50` for a comma separator).
pub fn format_decimal(value: f64, places: usize, separator: char, grouped: bool) -> String {
    let text = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + 4);
    if value.is_sign_negative() && text.chars().any(|ch| ch.is_ascii_digit() && ch != '0') {
        out.push('-');
    }
    if grouped {
        let group_mark = group_mark(separator);
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                out.push(group_mark);
            }
            out.push(ch);
        }
    } else {
        out.push_str(int_part);
    }
    if let Some(frac_part) = frac_part {
        out.push(separator);
        out.push_str(frac_part);
    }
    out
}

/// Inverse of [`format_decimal`]. Without the decimal mark the text is read
/// as a plain `.` or `,` decimal.
pub fn parse_decimal(text: &str, separator: char, grouped: bool) -> Option<f64> {
    let value = if text.contains(separator) {
        let group_mark = group_mark(separator);
        let normalized = text
            .chars()
            .filter(|ch| !(grouped && *ch == group_mark))
            .map(|ch| if ch == separator { '.' } else { ch })
            .collect::<String>();
        normalized.parse::<f64>().ok()
    } else {
        text.parse::<f64>()
            .ok()
            .or_else(|| text.replace(',', ".").parse::<f64>().ok())
    };
    value.filter(|v| v.is_finite())
}

fn group_mark(separator: char) -> char {
    if separator == ',' { '.' } else { ',' }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn default_decimal_separator() -> char {
    ','
}

fn default_rmsd_separator() -> char {
    '.'
}

fn default_not_available() -> String {
    NOT_AVAILABLE.to_string()
}
