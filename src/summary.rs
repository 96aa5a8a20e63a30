//! Read-only aggregation over a merged table: the mean of every metric
//! column, overall and per difficulty class.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{MetricKind, Tool};
use crate::numeric::{self, NumberFormat};
use crate::table::BenchmarkTable;

pub const DEFAULT_DIFFICULTY_COLUMN: &str = "Difficulty";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMean {
    pub metric: MetricKind,
    pub tool: Tool,
    pub mean: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyGroup {
    pub difficulty: String,
    pub rows: usize,
    pub means: Vec<MetricMean>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub rows: usize,
    pub overall: Vec<MetricMean>,
    pub by_difficulty: Option<Vec<DifficultyGroup>>,
}

impl MetricSummary {
    pub fn mean(&self, metric: MetricKind, tool: Tool) -> Option<f64> {
        find_mean(&self.overall, metric, tool)
    }

    pub fn group(&self, difficulty: &str) -> Option<&DifficultyGroup> {
        self.by_difficulty
            .as_ref()?
            .iter()
            .find(|group| group.difficulty == difficulty)
    }
}

impl DifficultyGroup {
    pub fn mean(&self, metric: MetricKind, tool: Tool) -> Option<f64> {
        find_mean(&self.means, metric, tool)
    }
}

fn find_mean(means: &[MetricMean], metric: MetricKind, tool: Tool) -> Option<f64> {
    means
        .iter()
        .find(|entry| entry.metric == metric && entry.tool == tool)
        .and_then(|entry| entry.mean)
}

/// Groups by metric kind and tool. Difficulty grouping is added when the
/// table has `difficulty_column`; rows with an empty difficulty are left out
/// of that grouping. Cells are read with `format`, the format they were
/// written with.
pub fn summarize(
    table: &BenchmarkTable,
    difficulty_column: &str,
    format: &NumberFormat,
) -> MetricSummary {
    let columns = metric_columns(table);
    let all_rows = table.rows().collect::<Vec<_>>();
    let overall = means_over(&columns, &all_rows, format);

    let by_difficulty = table.column_index(difficulty_column).map(|diff_col| {
        let mut groups = BTreeMap::<String, Vec<&[String]>>::new();
        for row in &all_rows {
            let difficulty = row.get(diff_col).map(|v| v.trim()).unwrap_or_default();
            if difficulty.is_empty() {
                continue;
            }
            groups.entry(difficulty.to_string()).or_default().push(*row);
        }
        groups
            .into_iter()
            .map(|(difficulty, rows)| DifficultyGroup {
                difficulty,
                rows: rows.len(),
                means: means_over(&columns, &rows, format),
            })
            .collect()
    });

    MetricSummary {
        rows: table.row_count(),
        overall,
        by_difficulty,
    }
}

fn metric_columns(table: &BenchmarkTable) -> Vec<(MetricKind, Tool, usize)> {
    let mut columns = Vec::new();
    for metric in MetricKind::ALL {
        for tool in Tool::ALL {
            if !tool.metrics().contains(&metric) {
                continue;
            }
            if let Some(idx) = table.column_index(&tool.column(metric)) {
                columns.push((metric, tool, idx));
            }
        }
    }
    columns
}

fn means_over(
    columns: &[(MetricKind, Tool, usize)],
    rows: &[&[String]],
    format: &NumberFormat,
) -> Vec<MetricMean> {
    columns
        .iter()
        .map(|&(metric, tool, idx)| {
            let values = rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| format.parse_cell(metric, cell)))
                .collect::<Vec<_>>();
            MetricMean {
                metric,
                tool,
                mean: numeric::mean(&values),
                count: values.len(),
            }
        })
        .collect()
}
