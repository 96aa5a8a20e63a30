use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::StructureFormat;
use crate::error::FoldBenchError;
use crate::ident::DisambiguationPolicy;
use crate::numeric::NumberFormat;
use crate::summary::DEFAULT_DIFFICULTY_COLUMN;
use crate::table::DEFAULT_TARGET_COLUMN;

pub const DEFAULT_CONFIG_FILE: &str = "kira-foldbench.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
    #[serde(default)]
    pub table: Option<PathBuf>,
    #[serde(default)]
    pub target_column: Option<String>,
    #[serde(default)]
    pub difficulty_column: Option<String>,
    #[serde(default)]
    pub disambiguation: Option<DisambiguationPolicy>,
    #[serde(default)]
    pub number_format: Option<NumberFormat>,
    #[serde(default)]
    pub alignment: Option<AlignmentConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlignmentConfig {
    #[serde(default)]
    pub pymol: Option<PathBuf>,
    #[serde(default)]
    pub obabel: Option<PathBuf>,
    #[serde(default)]
    pub native_format: Option<StructureFormat>,
    #[serde(default)]
    pub render_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AlignmentSettings {
    pub pymol: Option<PathBuf>,
    pub obabel: Option<PathBuf>,
    pub native_format: StructureFormat,
    pub render_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub results_dir: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub target_column: String,
    pub difficulty_column: String,
    pub disambiguation: DisambiguationPolicy,
    pub number_format: NumberFormat,
    pub alignment: AlignmentSettings,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `kira-foldbench.json` in the working directory when
    /// no path is given. A missing default file yields built-in defaults; a
    /// missing explicit file is an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FoldBenchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FoldBenchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FoldBenchError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let alignment = config.alignment.unwrap_or_default();
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            results_dir: config.results_dir,
            table: config.table,
            target_column: config
                .target_column
                .unwrap_or_else(|| DEFAULT_TARGET_COLUMN.to_string()),
            difficulty_column: config
                .difficulty_column
                .unwrap_or_else(|| DEFAULT_DIFFICULTY_COLUMN.to_string()),
            disambiguation: config.disambiguation.unwrap_or_default(),
            number_format: config.number_format.unwrap_or_default(),
            alignment: AlignmentSettings {
                pymol: alignment.pymol,
                obabel: alignment.obabel,
                native_format: alignment.native_format.unwrap_or(StructureFormat::Pdb),
                render_dir: alignment.render_dir,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_existing_tables() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.target_column, "Target");
        assert_eq!(resolved.difficulty_column, "Difficulty");
        assert_eq!(resolved.number_format.decimal_separator, ',');
        assert_eq!(resolved.alignment.native_format, StructureFormat::Pdb);
        assert!(resolved.alignment.render_dir.is_none());
    }
}
