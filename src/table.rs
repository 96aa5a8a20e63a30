use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;
use crate::numeric::NumberFormat;

pub const DEFAULT_TARGET_COLUMN: &str = "Target";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    Updated { row: usize },
    UnknownTarget,
}

/// The benchmark table held fully in memory. Rows are pre-allocated by
/// whoever creates the file; this type only updates cells.
#[derive(Debug, Clone)]
pub struct BenchmarkTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    key_column: usize,
}

impl BenchmarkTable {
    pub fn load(path: &Path, target_column: &str) -> Result<Self, FoldBenchError> {
        let content = std::fs::read(path).map_err(|err| FoldBenchError::TableRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(path, &content, target_column)
    }

    pub fn parse(path: &Path, content: &[u8], target_column: &str) -> Result<Self, FoldBenchError> {
        let read_err = |err: csv::Error| FoldBenchError::TableRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|value| value.trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();
        let key_column = headers
            .iter()
            .position(|name| name == target_column)
            .ok_or_else(|| {
                FoldBenchError::TableFormat(format!(
                    "{} has no `{target_column}` column",
                    path.display()
                ))
            })?;

        // Rows are held at exactly the header width. Empty trailing cells
        // beyond it are dropped.
        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(read_err)?;
            let mut row = record.iter().map(str::to_string).collect::<Vec<_>>();
            if row[headers.len().min(row.len())..]
                .iter()
                .any(|cell| !cell.trim().is_empty())
            {
                return Err(FoldBenchError::TableFormat(format!(
                    "{} row {} has {} cells but the header has {}",
                    path.display(),
                    idx + 2,
                    row.len(),
                    headers.len()
                )));
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
            key_column,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn find_row(&self, key: &TargetId) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(self.key_column).map(String::as_str) == Some(key.as_str()))
    }

    /// Cell text for `key` in `column`.
    pub fn value(&self, key: &TargetId, column: &str) -> Option<&str> {
        let row = self.find_row(key)?;
        let col = self.column_index(column)?;
        self.rows[row].get(col).map(String::as_str)
    }

    /// Appends `name` to the header if absent, padding every row.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        width - 1
    }

    /// Writes `bundle` into the columns owned by `tool` on the row keyed by
    /// `key`. Other tools' columns are never touched and no row is ever
    /// created.
    pub fn merge(
        &mut self,
        key: &TargetId,
        tool: Tool,
        bundle: &MetricBundle,
        format: &NumberFormat,
    ) -> MergeOutcome {
        let Some(row) = self.find_row(key) else {
            return MergeOutcome::UnknownTarget;
        };
        for metric in tool.metrics() {
            let col = self.ensure_column(&tool.column(*metric));
            self.rows[row][col] = format.render_cell(*metric, bundle.get(*metric));
        }
        MergeOutcome::Updated { row }
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, FoldBenchError> {
        let write_err = |message: String| FoldBenchError::TableWrite {
            path: self.path.clone(),
            message,
        };
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|err| write_err(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| write_err(err.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|err| write_err(err.to_string()))
    }

    /// Replaces the table file in one rename.
    pub fn save(&self) -> Result<(), FoldBenchError> {
        let bytes = self.to_csv_bytes()?;
        let write_err = |message: String| FoldBenchError::TableWrite {
            path: self.path.clone(),
            message,
        };
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".kira-foldbench-table")
            .tempfile_in(parent)
            .map_err(|err| write_err(err.to_string()))?;
        temp.write_all(&bytes)
            .map_err(|err| write_err(err.to_string()))?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.to_string()))?;
        Ok(())
    }
}
