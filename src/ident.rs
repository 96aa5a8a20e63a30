//! Identifier codec: raw identifiers embedded in tool output filenames, the
//! reference form used to name ground-truth structures, and the row-key
//! disambiguation applied to tools whose runs share one raw identifier.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::TargetId;

/// Number of leading characters rewritten by [`reference_form`].
pub const REFERENCE_PREFIX_LEN: usize = 10;

/// Matches `filename` against a tool pattern with exactly one capture group.
/// The whole filename must match; a pattern hit inside a longer name is
/// treated as no match.
pub fn raw_from_filename(pattern: &Regex, filename: &str) -> Option<TargetId> {
    let captures = pattern.captures(filename)?;
    let whole = captures.get(0)?;
    if whole.start() != 0 || whole.end() != filename.len() {
        return None;
    }
    let id = captures.get(1)?.as_str();
    if id.is_empty() {
        return None;
    }
    Some(TargetId::new(id))
}

/// Underscores inside the first ten characters become hyphens, the rest is
/// kept as is (`2024_07_06_00000149` -> `2024-07-06_00000149`).
///
/// Identifiers shorter than ten characters are rewritten in full; the
/// resulting reference path usually does not exist and callers treat that as
/// a missing reference structure.
pub fn reference_form(raw: &TargetId) -> TargetId {
    let value = raw.as_str();
    let split = value
        .char_indices()
        .nth(REFERENCE_PREFIX_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());
    let (prefix, rest) = value.split_at(split);
    TargetId::new(format!("{}{rest}", prefix.replace('_', "-")))
}

/// Filename of the ground-truth structure for a row key.
pub fn reference_filename(row_key: &TargetId) -> String {
    format!("{}_target.pdb", reference_form(row_key))
}

/// Maps a raw identifier to the table row key by appending a suffix. Used for
/// tools whose output naming drops the run index that the table keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationPolicy {
    #[serde(default = "default_suffix")]
    pub default_suffix: String,
    #[serde(default = "default_overrides")]
    pub overrides: BTreeMap<String, String>,
}

impl Default for DisambiguationPolicy {
    fn default() -> Self {
        Self {
            default_suffix: default_suffix(),
            overrides: default_overrides(),
        }
    }
}

impl DisambiguationPolicy {
    pub fn resolve(&self, raw: &TargetId) -> TargetId {
        let suffix = self
            .overrides
            .get(raw.as_str())
            .unwrap_or(&self.default_suffix);
        raw.with_suffix(suffix)
    }
}

fn default_suffix() -> String {
    "_1".to_string()
}

// The 2024-07-06 #149 Chai run was benchmarked against the second entry of
// that target.
fn default_overrides() -> BTreeMap<String, String> {
    BTreeMap::from([("2024_07_06_00000149".to_string(), "_2".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_requires_full_match() {
        let pattern = Regex::new(r"fold_([\d_]+)_full_data_0\.json").unwrap();
        assert_eq!(
            raw_from_filename(&pattern, "fold_2024_07_06_00000149_full_data_0.json"),
            Some(TargetId::new("2024_07_06_00000149"))
        );
        assert_eq!(
            raw_from_filename(&pattern, "old_fold_1_full_data_0.json"),
            None
        );
        assert_eq!(
            raw_from_filename(&pattern, "fold_1_full_data_0.json.bak"),
            None
        );
    }

    #[test]
    fn reference_form_rewrites_prefix_only() {
        let raw = TargetId::new("2024_07_06_00000149_2");
        assert_eq!(reference_form(&raw).as_str(), "2024-07-06_00000149_2");
    }

    #[test]
    fn short_identifier_does_not_panic() {
        assert_eq!(reference_form(&TargetId::new("1_2")).as_str(), "1-2");
        assert_eq!(reference_form(&TargetId::new("")).as_str(), "");
    }

    #[test]
    fn policy_prefers_override() {
        let policy = DisambiguationPolicy::default();
        assert_eq!(
            policy
                .resolve(&TargetId::new("2024_07_06_00000149"))
                .as_str(),
            "2024_07_06_00000149_2"
        );
        assert_eq!(
            policy
                .resolve(&TargetId::new("2024_07_06_00000150"))
                .as_str(),
            "2024_07_06_00000150_1"
        );
    }
}
