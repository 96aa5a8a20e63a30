use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::{MetricAdapter, default_adapters};
use crate::align::{AlignmentClient, FormatConverter, StructureAligner};
use crate::config::ResolvedConfig;
use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;
use crate::ident::reference_filename;
use crate::numeric::NumberFormat;
use crate::scan::{find_table, scan_artifacts};
use crate::summary::{MetricSummary, summarize};
use crate::table::{BenchmarkTable, MergeOutcome};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub results_dir: PathBuf,
    pub table: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: String,
    pub results_dir: String,
    pub table: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub merged: usize,
    pub unknown_targets: usize,
    pub skipped: usize,
    pub rmsd_missing: usize,
    pub persisted: bool,
    pub artifacts: Vec<ArtifactReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactReport {
    pub tool: Tool,
    pub raw_id: TargetId,
    pub row_key: TargetId,
    pub primary: String,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Merged {
        metrics: MetricBundle,
        alignment_error: Option<String>,
    },
    UnknownTarget,
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase {
        message: String,
        elapsed: Option<Duration>,
    },
    Target(TargetProgress),
}

/// One processed prediction, as shown on the diagnostic stream.
#[derive(Debug, Clone)]
pub struct TargetProgress {
    pub tool: Tool,
    pub raw_id: TargetId,
    pub row_key: TargetId,
    pub metrics: MetricBundle,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<A: StructureAligner, C: FormatConverter> {
    adapters: Vec<Box<dyn MetricAdapter>>,
    alignment: AlignmentClient<A, C>,
    number_format: NumberFormat,
    target_column: String,
}

impl<A: StructureAligner, C: FormatConverter> App<A, C> {
    pub fn new(config: &ResolvedConfig, aligner: A, converter: C) -> Self {
        let alignment = AlignmentClient::new(aligner, converter)
            .with_native_format(config.alignment.native_format)
            .with_render_dir(config.alignment.render_dir.clone());
        Self {
            adapters: default_adapters(config.disambiguation.clone()),
            alignment,
            number_format: config.number_format.clone(),
            target_column: config.target_column.clone(),
        }
    }

    /// Scans the results directory and merges every recognized prediction
    /// into the table, which is written back once at the end. Only table,
    /// config and results-directory failures are returned as errors.
    pub fn scan(
        &self,
        options: &ScanOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ScanReport, FoldBenchError> {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339();

        let table_path = match &options.table {
            Some(path) => path.clone(),
            None => find_table(&options.results_dir)?,
        };
        let mut table = BenchmarkTable::load(&table_path, &self.target_column)?;
        let rows_before = table.row_count();
        sink.event(ProgressEvent::Phase {
            message: format!(
                "phase=Load; {} rows from {}",
                rows_before,
                table_path.display()
            ),
            elapsed: Some(started.elapsed()),
        });

        let discovered = scan_artifacts(&options.results_dir, &self.adapters)?;
        sink.event(ProgressEvent::Phase {
            message: format!("phase=Scan; {} prediction runs found", discovered.len()),
            elapsed: Some(started.elapsed()),
        });

        let mut session = self.alignment.open_session()?;
        let mut artifacts = Vec::with_capacity(discovered.len());
        for item in discovered {
            let adapter = &self.adapters[item.adapter];
            let set = &item.artifacts;
            let raw_id = set.raw_id.clone();
            let row_key = adapter.row_key(&raw_id);
            let mut report = ArtifactReport {
                tool: set.tool,
                raw_id: raw_id.clone(),
                row_key: row_key.clone(),
                primary: set.primary.display().to_string(),
                status: ArtifactStatus::UnknownTarget,
            };

            let mut metrics = match adapter.extract(set, &raw_id) {
                Ok(metrics) => metrics,
                Err(err) => {
                    warn!("skipping {} run {raw_id}: {err}", set.tool);
                    report.status = ArtifactStatus::Skipped {
                        reason: err.to_string(),
                    };
                    artifacts.push(report);
                    continue;
                }
            };

            if table.find_row(&row_key).is_none() {
                warn!(
                    "unknown target {row_key} ({} run {raw_id}); table left unchanged",
                    set.tool
                );
                artifacts.push(report);
                continue;
            }

            let reference = reference_path(&set.primary, &row_key);
            let alignment_error = match session.align(&set.structure, &reference) {
                Ok(rmsd) => {
                    metrics.rmsd = Some(rmsd);
                    None
                }
                Err(err) => {
                    warn!("RMSD unavailable for {} {row_key}: {err}", set.tool);
                    Some(err.to_string())
                }
            };

            info!(
                tool = %set.tool,
                target = %row_key,
                "merged metrics"
            );
            sink.event(ProgressEvent::Target(TargetProgress {
                tool: set.tool,
                raw_id: raw_id.clone(),
                row_key: row_key.clone(),
                metrics,
            }));

            report.status = match table.merge(&row_key, set.tool, &metrics, &self.number_format) {
                MergeOutcome::Updated { .. } => ArtifactStatus::Merged {
                    metrics,
                    alignment_error,
                },
                MergeOutcome::UnknownTarget => ArtifactStatus::UnknownTarget,
            };
            artifacts.push(report);
        }
        drop(session);

        let persisted = !options.dry_run;
        if persisted {
            table.save()?;
            sink.event(ProgressEvent::Phase {
                message: format!("phase=Store; wrote {}", table_path.display()),
                elapsed: Some(started.elapsed()),
            });
        }

        let (mut merged, mut unknown_targets, mut skipped, mut rmsd_missing) = (0, 0, 0, 0);
        for item in &artifacts {
            match &item.status {
                ArtifactStatus::Merged {
                    alignment_error, ..
                } => {
                    merged += 1;
                    if alignment_error.is_some() {
                        rmsd_missing += 1;
                    }
                }
                ArtifactStatus::UnknownTarget => unknown_targets += 1,
                ArtifactStatus::Skipped { .. } => skipped += 1,
            }
        }

        Ok(ScanReport {
            started_at,
            results_dir: options.results_dir.display().to_string(),
            table: table_path.display().to_string(),
            rows_before,
            rows_after: table.row_count(),
            merged,
            unknown_targets,
            skipped,
            rmsd_missing,
            persisted,
            artifacts,
        })
    }
}

/// Grouped means over an already merged table.
pub fn summarize_table(
    config: &ResolvedConfig,
    table_path: &Path,
) -> Result<MetricSummary, FoldBenchError> {
    let table = BenchmarkTable::load(table_path, &config.target_column)?;
    Ok(summarize(
        &table,
        &config.difficulty_column,
        &config.number_format,
    ))
}

/// Ground-truth structures live next to the prediction files.
fn reference_path(primary: &Path, row_key: &TargetId) -> PathBuf {
    let dir = primary.parent().unwrap_or_else(|| Path::new("."));
    dir.join(reference_filename(row_key))
}
