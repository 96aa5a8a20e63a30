pub mod chai;
pub mod fold;
pub mod protenix;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;
use crate::ident::{self, DisambiguationPolicy};

pub use chai::ChaiAdapter;
pub use fold::FoldAdapter;
pub use protenix::ProtenixAdapter;

/// Sibling files that make up one prediction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub tool: Tool,
    pub raw_id: TargetId,
    pub primary: PathBuf,
    pub summary: PathBuf,
    pub structure: PathBuf,
}

/// One prediction tool's output layout.
pub trait MetricAdapter: Send + Sync {
    fn tool(&self) -> Tool;

    /// Raw identifier when `filename` is this tool's primary artifact.
    fn discover(&self, filename: &str) -> Option<TargetId>;

    /// Sibling paths for `raw_id` inside `dir`, from the tool's fixed naming
    /// template.
    fn artifacts(&self, dir: &Path, raw_id: &TargetId) -> ArtifactSet;

    /// Table row key for a raw identifier.
    fn row_key(&self, raw_id: &TargetId) -> TargetId {
        raw_id.clone()
    }

    /// Reads the primary and summary artifacts. Fails only when the primary
    /// artifact is missing or unreadable; problems with the summary file
    /// degrade to a `None` global score.
    fn extract(
        &self,
        artifacts: &ArtifactSet,
        raw_id: &TargetId,
    ) -> Result<MetricBundle, FoldBenchError>;
}

/// The three supported tools, in classification order.
pub fn default_adapters(policy: DisambiguationPolicy) -> Vec<Box<dyn MetricAdapter>> {
    vec![
        Box::new(FoldAdapter::new()),
        Box::new(ProtenixAdapter::new()),
        Box::new(ChaiAdapter::new(policy)),
    ]
}

/// Field names of a JSON confidence artifact pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonLayout {
    pub plddt_field: &'static str,
    pub pae_field: &'static str,
    pub score_field: &'static str,
}

pub(crate) fn extract_json_pair(
    layout: JsonLayout,
    artifacts: &ArtifactSet,
) -> Result<MetricBundle, FoldBenchError> {
    let primary = read_json(&artifacts.primary)?;
    let plddt_mean = mean_of_field(&primary, layout.plddt_field, &artifacts.primary)?;
    let pae_mean = mean_of_field(&primary, layout.pae_field, &artifacts.primary)?;
    let global_score = global_score_or_none(&artifacts.summary, layout.score_field);

    Ok(MetricBundle {
        plddt_mean,
        pae_mean,
        global_score,
        rmsd: None,
    })
}

pub(crate) fn read_json(path: &Path) -> Result<Value, FoldBenchError> {
    let content = fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            FoldBenchError::MissingSibling(path.to_path_buf())
        } else {
            FoldBenchError::malformed(path, err)
        }
    })?;
    serde_json::from_str(&content).map_err(|err| FoldBenchError::malformed(path, err))
}

/// Mean over every number in a (possibly nested) array field. Missing field,
/// `null` and empty arrays give `None`.
pub(crate) fn mean_of_field(
    value: &Value,
    field: &str,
    path: &Path,
) -> Result<Option<f64>, FoldBenchError> {
    let Some(node) = value.get(field) else {
        return Ok(None);
    };
    if node.is_null() {
        return Ok(None);
    }
    if !node.is_array() {
        return Err(FoldBenchError::malformed(
            path,
            format!("field `{field}` is not an array"),
        ));
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    accumulate(node, &mut sum, &mut count)
        .map_err(|message| FoldBenchError::malformed(path, format!("field `{field}`: {message}")))?;
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}

fn accumulate(node: &Value, sum: &mut f64, count: &mut usize) -> Result<(), String> {
    match node {
        Value::Array(items) => {
            for item in items {
                accumulate(item, sum, count)?;
            }
            Ok(())
        }
        Value::Number(number) => {
            let value = number
                .as_f64()
                .ok_or_else(|| format!("number out of range: {number}"))?;
            *sum += value;
            *count += 1;
            Ok(())
        }
        other => Err(format!("non-numeric element {other}")),
    }
}

pub(crate) fn read_global_score(path: &Path, field: &str) -> Result<Option<f64>, FoldBenchError> {
    let value = read_json(path)?;
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(other) => Err(FoldBenchError::malformed(
            path,
            format!("field `{field}` is not a number: {other}"),
        )),
    }
}

pub(crate) fn global_score_or_none(path: &Path, field: &str) -> Option<f64> {
    match read_global_score(path, field) {
        Ok(score) => score,
        Err(err) => {
            warn!("{err}; {field} left empty");
            None
        }
    }
}

pub(crate) fn discover_with(pattern: &regex::Regex, filename: &str) -> Option<TargetId> {
    ident::raw_from_filename(pattern, filename)
}
