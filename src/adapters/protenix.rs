//! Protenix output. Files carry the `Photenix_` prefix used by the run
//! scripts that produced the benchmark.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::adapters::{ArtifactSet, JsonLayout, MetricAdapter, discover_with, extract_json_pair};
use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;

static PRIMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Photenix_([\d_]+)_full_data_sample_0\.json$").expect("protenix pattern")
});

const LAYOUT: JsonLayout = JsonLayout {
    plddt_field: "atom_plddt",
    pae_field: "token_pair_pae",
    score_field: "ptm",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProtenixAdapter;

impl ProtenixAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl MetricAdapter for ProtenixAdapter {
    fn tool(&self) -> Tool {
        Tool::Protenix
    }

    fn discover(&self, filename: &str) -> Option<TargetId> {
        discover_with(&PRIMARY_RE, filename)
    }

    fn artifacts(&self, dir: &Path, raw_id: &TargetId) -> ArtifactSet {
        ArtifactSet {
            tool: Tool::Protenix,
            raw_id: raw_id.clone(),
            primary: dir.join(format!("Photenix_{raw_id}_full_data_sample_0.json")),
            summary: dir.join(format!("Photenix_{raw_id}_summary_confidence_sample_0.json")),
            structure: dir.join(format!("Photenix_{raw_id}_sample_0.cif")),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_protenix_primary() {
        let adapter = ProtenixAdapter::new();
        assert_eq!(
            adapter.discover("Photenix_2024_07_13_00000020_full_data_sample_0.json"),
            Some(TargetId::new("2024_07_13_00000020"))
        );
        assert_eq!(
            adapter.discover("Protenix_2024_07_13_00000020_full_data_sample_0.json"),
            None
        );
    }
}
