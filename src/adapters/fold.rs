//! AlphaFold 3 server output (`fold_<id>_*`).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::adapters::{ArtifactSet, JsonLayout, MetricAdapter, discover_with, extract_json_pair};
use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;

static PRIMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fold_([\d_]+)_full_data_0\.json$").expect("fold pattern"));

const LAYOUT: JsonLayout = JsonLayout {
    plddt_field: "atom_plddts",
    pae_field: "pae",
    score_field: "ptm",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FoldAdapter;

impl FoldAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl MetricAdapter for FoldAdapter {
    fn tool(&self) -> Tool {
        Tool::Fold
    }

    fn discover(&self, filename: &str) -> Option<TargetId> {
        discover_with(&PRIMARY_RE, filename)
    }

    fn artifacts(&self, dir: &Path, raw_id: &TargetId) -> ArtifactSet {
        ArtifactSet {
            tool: Tool::Fold,
            raw_id: raw_id.clone(),
            primary: dir.join(format!("fold_{raw_id}_full_data_0.json")),
            summary: dir.join(format!("fold_{raw_id}_summary_confidences_0.json")),
            structure: dir.join(format!("fold_{raw_id}_model_0.cif")),
        }
    }

    fn extract(
        &self,
        artifacts: &ArtifactSet,
        _raw_id: &TargetId,
    ) -> Result<MetricBundle, FoldBenchError> {
        extract_json_pair(LAYOUT, artifacts)
    }
}
