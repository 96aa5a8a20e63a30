mod common;

use std::fs;

use assert_matches::assert_matches;

use kira_foldbench::adapters::{ChaiAdapter, FoldAdapter, MetricAdapter, ProtenixAdapter};
use kira_foldbench::domain::TargetId;
use kira_foldbench::error::FoldBenchError;
use kira_foldbench::ident::DisambiguationPolicy;

#[test]
fn fold_means_over_atoms_and_matrix() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    fs::write(
        temp.path().join("fold_2024_07_06_00000149_full_data_0.json"),
        r#"{"atom_plddts": [80, 90], "pae": [[1, 2], [3, 4]], "token_chain_ids": ["A", "A"]}"#,
    )
    .unwrap();
    fs::write(
        temp.path()
            .join("fold_2024_07_06_00000149_summary_confidences_0.json"),
        r#"{"ptm": 0.91}"#,
    )
    .unwrap();

    let adapter = FoldAdapter::new();
    let set = adapter.artifacts(temp.path(), &id);
    let bundle = adapter.extract(&set, &id).unwrap();
    assert_eq!(bundle.plddt_mean, Some(85.0));
    assert_eq!(bundle.pae_mean, Some(2.5));
    assert_eq!(bundle.global_score, Some(0.91));
    assert_eq!(bundle.rmsd, None);
}

#[test]
fn protenix_uses_its_own_field_names() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_13_00000020");
    fs::write(
        temp.path()
            .join("Photenix_2024_07_13_00000020_full_data_sample_0.json"),
        r#"{"atom_plddt": [70.0, 72.0, 74.0], "token_pair_pae": [[0.5, 1.5]]}"#,
    )
    .unwrap();
    fs::write(
        temp.path()
            .join("Photenix_2024_07_13_00000020_summary_confidence_sample_0.json"),
        r#"{"ptm": 0.4, "iptm": 0.3}"#,
    )
    .unwrap();

    let adapter = ProtenixAdapter::new();
    let set = adapter.artifacts(temp.path(), &id);
    let bundle = adapter.extract(&set, &id).unwrap();
    assert_eq!(bundle.plddt_mean, Some(72.0));
    assert_eq!(bundle.pae_mean, Some(1.0));
    assert_eq!(bundle.global_score, Some(0.4));
}

#[test]
fn missing_field_yields_null_metric() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    fs::write(
        temp.path().join("fold_2024_07_06_00000149_full_data_0.json"),
        r#"{"pae": [[2, 2]]}"#,
    )
    .unwrap();

    let adapter = FoldAdapter::new();
    let set = adapter.artifacts(temp.path(), &id);
    let bundle = adapter.extract(&set, &id).unwrap();
    assert_eq!(bundle.plddt_mean, None);
    assert_eq!(bundle.pae_mean, Some(2.0));
    assert_eq!(bundle.global_score, None);
}

#[test]
fn malformed_primary_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    fs::write(
        temp.path().join("fold_2024_07_06_00000149_full_data_0.json"),
        "not json",
    )
    .unwrap();

    let adapter = FoldAdapter::new();
    let set = adapter.artifacts(temp.path(), &id);
    let err = adapter.extract(&set, &id).unwrap_err();
    assert_matches!(err, FoldBenchError::MalformedArtifact { .. });
    assert!(!err.is_fatal());
}

#[test]
fn chai_empty_matrix_yields_null_pae() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    fs::write(
        temp.path().join("Chai_2024_07_06_00000149_rank_0.npy"),
        common::npy_f64(&[0, 0], &[]),
    )
    .unwrap();
    fs::write(
        temp.path().join("Chai_2024_07_06_00000149_rank_0.json"),
        r#"{"ptm": 0.55}"#,
    )
    .unwrap();

    let adapter = ChaiAdapter::new(DisambiguationPolicy::default());
    let set = adapter.artifacts(temp.path(), &id);
    let bundle = adapter.extract(&set, &id).unwrap();
    assert_eq!(bundle.pae_mean, None);
    assert_eq!(bundle.plddt_mean, None);
    assert_eq!(bundle.global_score, Some(0.55));
}

#[test]
fn chai_missing_matrix_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    let adapter = ChaiAdapter::new(DisambiguationPolicy::default());
    let set = adapter.artifacts(temp.path(), &id);
    assert!(adapter.extract(&set, &id).is_err());
}

#[test]
fn chai_row_keys_follow_policy() {
    let adapter = ChaiAdapter::new(DisambiguationPolicy::default());
    assert_eq!(
        adapter
            .row_key(&TargetId::new("2024_07_06_00000149"))
            .as_str(),
        "2024_07_06_00000149_2"
    );
    assert_eq!(
        adapter
            .row_key(&TargetId::new("2024_07_13_00000020"))
            .as_str(),
        "2024_07_13_00000020_1"
    );
    let fold = FoldAdapter::new();
    assert_eq!(
        fold.row_key(&TargetId::new("2024_07_13_00000020")).as_str(),
        "2024_07_13_00000020"
    );
}

#[test]
fn chai_unsupported_dtype_is_malformed() {
    let temp = tempfile::tempdir().unwrap();
    let id = TargetId::new("2024_07_06_00000149");
    fs::write(
        temp.path().join("Chai_2024_07_06_00000149_rank_0.npy"),
        common::npy_with_header(
            "{'descr': '<f0', 'fortran_order': False, 'shape': (2,), }",
            &[0u8; 16],
        ),
    )
    .unwrap();

    let adapter = ChaiAdapter::new(DisambiguationPolicy::default());
    let set = adapter.artifacts(temp.path(), &id);
    assert_matches!(
        adapter.extract(&set, &id),
        Err(FoldBenchError::MalformedArtifact { .. })
    );
}
