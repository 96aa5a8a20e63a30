use std::fmt;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FoldBenchError;

/// Benchmark target identifier as it appears in tool output filenames and in
/// the table's target column (digits and underscores, e.g.
/// `2024_07_06_00000149`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{suffix}", self.0))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Fold,
    Protenix,
    Chai,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Fold, Tool::Protenix, Tool::Chai];

    /// Column suffix used by the benchmark table.
    pub fn column_label(&self) -> &'static str {
        match self {
            Tool::Fold => "Fold",
            Tool::Protenix => "Protenix",
            Tool::Chai => "Chai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Fold => "AlphaFold 3",
            Tool::Protenix => "Protenix",
            Tool::Chai => "Chai-1",
        }
    }

    /// Metric kinds this tool reports. Chai runs carry no per-residue
    /// confidence array.
    pub fn metrics(&self) -> &'static [MetricKind] {
        match self {
            Tool::Fold | Tool::Protenix => &[
                MetricKind::Plddt,
                MetricKind::Pae,
                MetricKind::Ptm,
                MetricKind::Rmsd,
            ],
            Tool::Chai => &[MetricKind::Pae, MetricKind::Ptm, MetricKind::Rmsd],
        }
    }

    pub fn column(&self, metric: MetricKind) -> String {
        format!("{}_{}", metric.column_label(), self.column_label())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Pae,
    Plddt,
    Ptm,
    Rmsd,
}

impl MetricKind {
    /// Report order of metric groups.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Pae,
        MetricKind::Plddt,
        MetricKind::Ptm,
        MetricKind::Rmsd,
    ];

    pub fn column_label(&self) -> &'static str {
        match self {
            MetricKind::Pae => "PAE",
            MetricKind::Plddt => "pLDDT",
            MetricKind::Ptm => "pTM",
            MetricKind::Rmsd => "RMSD",
        }
    }

    /// Values reported by the prediction tool itself, as opposed to values
    /// derived here.
    pub fn is_tool_reported(&self) -> bool {
        !matches!(self, MetricKind::Rmsd)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    Cif,
    Pdb,
}

impl StructureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StructureFormat::Cif => "cif",
            StructureFormat::Pdb => "pdb",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, FoldBenchError> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for StructureFormat {
    type Err = FoldBenchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cif" | "mmcif" => Ok(StructureFormat::Cif),
            "pdb" | "ent" => Ok(StructureFormat::Pdb),
            _ => Err(FoldBenchError::UnsupportedStructureFormat(value.to_string())),
        }
    }
}

/// Normalized metrics for one (target, tool) pair. A `None` field means the
/// source data was missing, empty or malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricBundle {
    pub plddt_mean: Option<f64>,
    pub pae_mean: Option<f64>,
    pub global_score: Option<f64>,
    pub rmsd: Option<f64>,
}

impl MetricBundle {
    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Plddt => self.plddt_mean,
            MetricKind::Pae => self.pae_mean,
            MetricKind::Ptm => self.global_score,
            MetricKind::Rmsd => self.rmsd,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn tool_columns_follow_table_naming() {
        assert_eq!(Tool::Fold.column(MetricKind::Plddt), "pLDDT_Fold");
        assert_eq!(Tool::Protenix.column(MetricKind::Rmsd), "RMSD_Protenix");
        assert_eq!(Tool::Chai.column(MetricKind::Ptm), "pTM_Chai");
        assert!(!Tool::Chai.metrics().contains(&MetricKind::Plddt));
    }

    #[test]
    fn structure_format_from_extension() {
        let format = StructureFormat::from_path(Path::new("/x/fold_1_model_0.CIF")).unwrap();
        assert_eq!(format, StructureFormat::Cif);
        let err = StructureFormat::from_path(Path::new("/x/model.xyz")).unwrap_err();
        assert_matches!(err, FoldBenchError::UnsupportedStructureFormat(_));
    }
}
