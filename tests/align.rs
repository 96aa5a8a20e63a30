use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;

use kira_foldbench::align::{AlignmentClient, FormatConverter, StructureAligner, parse_rmsd};
use kira_foldbench::domain::StructureFormat;
use kira_foldbench::error::FoldBenchError;

#[derive(Default, Clone)]
struct Recorder {
    superposed: Arc<Mutex<Vec<(PathBuf, PathBuf, Option<PathBuf>)>>>,
    converted: Arc<Mutex<Vec<PathBuf>>>,
    workspaces: Arc<Mutex<Vec<PathBuf>>>,
}

struct FixedAligner {
    rmsd: f64,
    log: Recorder,
}

impl StructureAligner for FixedAligner {
    fn superpose(
        &self,
        first: &Path,
        second: &Path,
        workspace: &Path,
        image: Option<&Path>,
    ) -> Result<f64, FoldBenchError> {
        self.log.superposed.lock().unwrap().push((
            first.to_path_buf(),
            second.to_path_buf(),
            image.map(Path::to_path_buf),
        ));
        self.log
            .workspaces
            .lock()
            .unwrap()
            .push(workspace.to_path_buf());
        Ok(self.rmsd)
    }
}

struct TouchConverter {
    log: Recorder,
}

impl FormatConverter for TouchConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), FoldBenchError> {
        self.log.converted.lock().unwrap().push(input.to_path_buf());
        fs::write(output, "converted\n").map_err(|err| FoldBenchError::Conversion(err.to_string()))
    }
}

struct FailingConverter;

impl FormatConverter for FailingConverter {
    fn convert(&self, _input: &Path, _output: &Path) -> Result<(), FoldBenchError> {
        Err(FoldBenchError::Conversion("obabel exited with 1".into()))
    }
}

fn client(rmsd: f64) -> (AlignmentClient<FixedAligner, TouchConverter>, Recorder) {
    let log = Recorder::default();
    let client = AlignmentClient::new(
        FixedAligner {
            rmsd,
            log: log.clone(),
        },
        TouchConverter { log: log.clone() },
    );
    (client, log)
}

fn structures(dir: &Path) -> (PathBuf, PathBuf) {
    let predicted = dir.join("fold_2024_07_06_00000149_model_0.cif");
    let reference = dir.join("2024-07-06_00000149_target.pdb");
    fs::write(&predicted, "data_model\n").unwrap();
    fs::write(&reference, "ATOM\n").unwrap();
    (predicted, reference)
}

#[test]
fn same_format_skips_conversion() {
    let temp = tempfile::tempdir().unwrap();
    let first = temp.path().join("a.pdb");
    let second = temp.path().join("b.pdb");
    fs::write(&first, "ATOM\n").unwrap();
    fs::write(&second, "ATOM\n").unwrap();

    let (client, log) = client(0.75);
    let mut session = client.open_session().unwrap();
    assert_eq!(session.align(&first, &second).unwrap(), 0.75);
    assert!(log.converted.lock().unwrap().is_empty());
    assert_eq!(
        log.superposed.lock().unwrap()[0],
        (first.clone(), second.clone(), None)
    );
}

#[test]
fn cif_model_is_converted_to_pdb() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());

    let (client, log) = client(1.1);
    let mut session = client.open_session().unwrap();
    session.align(&predicted, &reference).unwrap();

    assert_eq!(log.converted.lock().unwrap().as_slice(), &[predicted.clone()]);
    let superposed = log.superposed.lock().unwrap();
    assert_eq!(
        superposed[0].0.file_name().and_then(|v| v.to_str()),
        Some("fold_2024_07_06_00000149_model_0.pdb")
    );
    assert_eq!(superposed[0].1, reference);
}

#[test]
fn cif_native_converts_reference_instead() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());

    let (client, log) = client(1.1);
    let client = client.with_native_format(StructureFormat::Cif);
    let mut session = client.open_session().unwrap();
    session.align(&predicted, &reference).unwrap();

    assert_eq!(log.converted.lock().unwrap().as_slice(), &[reference.clone()]);
    let superposed = log.superposed.lock().unwrap();
    assert_eq!(superposed[0].0, predicted);
    assert_eq!(
        superposed[0].1.extension().and_then(|v| v.to_str()),
        Some("cif")
    );
}

#[test]
fn scratch_space_is_cleared_between_comparisons() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());

    let (client, log) = client(2.0);
    let mut session = client.open_session().unwrap();
    session.align(&predicted, &reference).unwrap();
    session.align(&predicted, &reference).unwrap();
    assert_eq!(session.comparisons(), 2);

    let workspaces = log.workspaces.lock().unwrap();
    assert_ne!(workspaces[0], workspaces[1]);
    assert!(!workspaces[0].exists());
    assert!(!workspaces[1].exists());
    drop(session);
}

#[test]
fn missing_reference_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, _) = structures(temp.path());
    let absent = temp.path().join("2024-07-06_00000150_target.pdb");

    let (client, log) = client(1.0);
    let mut session = client.open_session().unwrap();
    let err = session.align(&predicted, &absent).unwrap_err();
    assert_matches!(err, FoldBenchError::MissingStructure(path) if path == absent);
    assert!(log.superposed.lock().unwrap().is_empty());
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, _) = structures(temp.path());
    let reference = temp.path().join("target.xyz");
    fs::write(&reference, "1\n").unwrap();

    let (client, _) = client(1.0);
    let mut session = client.open_session().unwrap();
    assert_matches!(
        session.align(&predicted, &reference),
        Err(FoldBenchError::UnsupportedStructureFormat(_))
    );
}

#[test]
fn conversion_failure_propagates() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());
    let client = AlignmentClient::new(
        FixedAligner {
            rmsd: 1.0,
            log: Recorder::default(),
        },
        FailingConverter,
    );
    let mut session = client.open_session().unwrap();
    assert_matches!(
        session.align(&predicted, &reference),
        Err(FoldBenchError::Conversion(_))
    );
}

#[test]
fn non_finite_rmsd_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());
    let (client, _) = client(f64::NAN);
    let mut session = client.open_session().unwrap();
    assert_matches!(
        session.align(&predicted, &reference),
        Err(FoldBenchError::Alignment(_))
    );
}

#[test]
fn render_dir_receives_image_path() {
    let temp = tempfile::tempdir().unwrap();
    let (predicted, reference) = structures(temp.path());
    let render_dir = temp.path().join("renders");

    let (client, log) = client(1.0);
    let client = client.with_render_dir(Some(render_dir.clone()));
    let mut session = client.open_session().unwrap();
    assert!(render_dir.is_dir());
    session.align(&predicted, &reference).unwrap();
    assert_eq!(
        log.superposed.lock().unwrap()[0].2,
        Some(render_dir.join("fold_2024_07_06_00000149_model_0_aligned.png"))
    );
}

#[test]
fn pymol_output_is_parsed() {
    assert_eq!(parse_rmsd(" PyMOL not running\nRMSD=1.234500\n"), Some(1.2345));
    assert_eq!(parse_rmsd("Executive: RMSD = 0.5\n"), None);
}
