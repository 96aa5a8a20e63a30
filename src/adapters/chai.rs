//! Chai-1 output: the PAE matrix as a raw `.npy` file and the aggregate
//! scores in a JSON file next to it. Chai filenames drop the run index kept
//! by the table, so row keys go through a [`DisambiguationPolicy`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::adapters::{ArtifactSet, MetricAdapter, discover_with, global_score_or_none};
use crate::domain::{MetricBundle, TargetId, Tool};
use crate::error::FoldBenchError;
use crate::ident::DisambiguationPolicy;
use crate::npy;
use crate::numeric;

static PRIMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Chai_([\d_]+)_rank_0\.npy$").expect("chai pattern"));

const SCORE_FIELD: &str = "ptm";

#[derive(Debug, Clone, Default)]
pub struct ChaiAdapter {
    policy: DisambiguationPolicy,
}

impl ChaiAdapter {
    pub fn new(policy: DisambiguationPolicy) -> Self {
        Self { policy }
    }
}

impl MetricAdapter for ChaiAdapter {
    fn tool(&self) -> Tool {
        Tool::Chai
    }

    fn discover(&self, filename: &str) -> Option<TargetId> {
        discover_with(&PRIMARY_RE, filename)
    }

    fn artifacts(&self, dir: &Path, raw_id: &TargetId) -> ArtifactSet {
        ArtifactSet {
            tool: Tool::Chai,
            raw_id: raw_id.clone(),
            primary: dir.join(format!("Chai_{raw_id}_rank_0.npy")),
            summary: dir.join(format!("Chai_{raw_id}_rank_0.json")),
            structure: dir.join(format!("Chai_{raw_id}_sample_0.cif")),
        }
    }

    fn row_key(&self, raw_id: &TargetId) -> TargetId {
        self.policy.resolve(raw_id)
    }

    fn extract(
        &self,
        artifacts: &ArtifactSet,
        _raw_id: &TargetId,
    ) -> Result<MetricBundle, FoldBenchError> {
        let pae = npy::read_npy(&artifacts.primary)?;
        let pae_mean = numeric::mean(&pae.data);
        let global_score = global_score_or_none(&artifacts.summary, SCORE_FIELD);

        Ok(MetricBundle {
            plddt_mean: None,
            pae_mean,
            global_score,
            rmsd: None,
        })
    }
}
