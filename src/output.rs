use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink, ScanReport, TargetProgress};
use crate::domain::{MetricKind, Tool};
use crate::numeric::{NumberFormat, format_decimal};
use crate::summary::{MetricMean, MetricSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_scan(result: &ScanReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_summary(result: &MetricSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Prints one block per merged prediction to stdout.
pub struct ConsoleOutput {
    format: NumberFormat,
}

impl ConsoleOutput {
    pub fn new(format: NumberFormat) -> Self {
        Self { format }
    }

    pub fn print_scan(&self, result: &ScanReport) {
        println!(
            "{} merged, {} unknown targets, {} skipped, {} without RMSD ({} rows in {})",
            result.merged,
            result.unknown_targets,
            result.skipped,
            result.rmsd_missing,
            result.rows_after,
            result.table
        );
        if !result.persisted {
            println!("dry run: table not written");
        }
    }

    pub fn print_summary(&self, summary: &MetricSummary) {
        print!("{}", render_summary(summary));
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { message, elapsed } => match elapsed {
                Some(elapsed) => info!("{message} ({:.2}s)", elapsed.as_secs_f64()),
                None => info!("{message}"),
            },
            ProgressEvent::Target(progress) => {
                print!("{}", render_target(&progress, &self.format));
            }
        }
    }
}

pub fn render_target(progress: &TargetProgress, format: &NumberFormat) -> String {
    let metrics = &progress.metrics;
    let mut out = String::new();
    let _ = writeln!(out, "File ID: {}", progress.raw_id);
    if progress.row_key != progress.raw_id {
        let _ = writeln!(out, "Row: {}", progress.row_key);
    }
    let _ = writeln!(out, "{} Metrics", progress.tool.display_name());
    for metric in progress.tool.metrics() {
        let value = format.render_display(*metric, metrics.get(*metric));
        match metric {
            MetricKind::Plddt => {
                let _ = writeln!(out, "Mean of pLDDT Score: {value}");
            }
            MetricKind::Pae => {
                let _ = writeln!(out, "Mean of PAE Score: {value}");
            }
            MetricKind::Ptm => {
                let _ = writeln!(out, "PTM Score: {value}");
            }
            MetricKind::Rmsd => {
                let unit = if metrics.rmsd.is_some() { " Å" } else { "" };
                let _ = writeln!(out, "RMSD Value: {value}{unit}");
            }
        }
    }
    out.push('\n');
    out
}

/// Pivot tables: metric groups as rows, tools as columns.
pub fn render_summary(summary: &MetricSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nMean by metric group:\n");
    render_pivot(&mut out, None, 0, &summary.overall);

    if let Some(groups) = &summary.by_difficulty {
        let _ = writeln!(out, "\nMean by metric group and difficulty:\n");
        let label_width = groups
            .iter()
            .map(|group| group.difficulty.chars().count() + 2)
            .max()
            .unwrap_or(0);
        for group in groups {
            render_pivot(&mut out, Some(&group.difficulty), label_width, &group.means);
        }
    }
    out
}

fn render_pivot(out: &mut String, label: Option<&str>, label_width: usize, means: &[MetricMean]) {
    let _ = write!(out, "{:label_width$}{:<8}", "", "");
    for tool in Tool::ALL {
        let _ = write!(out, "{:>12}", tool.column_label());
    }
    out.push('\n');

    for metric in MetricKind::ALL {
        if !means.iter().any(|entry| entry.metric == metric) {
            continue;
        }
        let prefix = label.unwrap_or_default();
        let _ = write!(out, "{:label_width$}{:<8}", prefix, metric.column_label());
        for tool in Tool::ALL {
            let cell = means
                .iter()
                .find(|entry| entry.metric == metric && entry.tool == tool)
                .and_then(|entry| entry.mean)
                .map(|value| format_decimal(value, 6, '.', false))
                .unwrap_or_else(|| "NaN".to_string());
            let _ = write!(out, "{cell:>12}");
        }
        out.push('\n');
    }
}
