use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use crate::domain::StructureFormat;
use crate::error::FoldBenchError;

/// External superposition service. Returns the RMSD in Ångström between two
/// structures of the same format.
pub trait StructureAligner: Send + Sync {
    fn superpose(
        &self,
        first: &Path,
        second: &Path,
        workspace: &Path,
        image: Option<&Path>,
    ) -> Result<f64, FoldBenchError>;

    fn availability(&self) -> Result<(), FoldBenchError> {
        Ok(())
    }
}

/// External structure format conversion service.
pub trait FormatConverter: Send + Sync {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), FoldBenchError>;

    fn availability(&self) -> Result<(), FoldBenchError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPlan {
    None,
    ConvertFirst(StructureFormat),
    ConvertSecond(StructureFormat),
}

/// Decides which input gets converted so both share one format. The file
/// whose format the aligner does not take natively is the one converted.
pub fn plan_conversion(
    first: StructureFormat,
    second: StructureFormat,
    native: StructureFormat,
) -> ConversionPlan {
    if first == second {
        ConversionPlan::None
    } else if first != native {
        ConversionPlan::ConvertFirst(second)
    } else {
        ConversionPlan::ConvertSecond(first)
    }
}

pub struct AlignmentClient<A: StructureAligner, C: FormatConverter> {
    aligner: A,
    converter: C,
    native_format: StructureFormat,
    render_dir: Option<PathBuf>,
}

impl<A: StructureAligner, C: FormatConverter> AlignmentClient<A, C> {
    pub fn new(aligner: A, converter: C) -> Self {
        Self {
            aligner,
            converter,
            native_format: StructureFormat::Pdb,
            render_dir: None,
        }
    }

    pub fn with_native_format(mut self, format: StructureFormat) -> Self {
        self.native_format = format;
        self
    }

    /// Enables the diagnostic PNG of every superposition, written into `dir`.
    pub fn with_render_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.render_dir = dir;
        self
    }

    /// Acquires the scratch space used for converted structures. The session
    /// is meant to live for one scan; dropping it removes the scratch space.
    pub fn open_session(&self) -> Result<AlignmentSession<'_, A, C>, FoldBenchError> {
        if let Err(err) = self.aligner.availability() {
            warn!("{err}; RMSD values will be left empty");
        }
        if let Err(err) = self.converter.availability() {
            warn!("{err}; mixed-format comparisons will fail");
        }
        if let Some(dir) = &self.render_dir {
            fs::create_dir_all(dir).map_err(|err| FoldBenchError::Filesystem(err.to_string()))?;
        }
        let workspace = Builder::new()
            .prefix("kira-foldbench-align")
            .tempdir()
            .map_err(|err| FoldBenchError::Filesystem(err.to_string()))?;
        Ok(AlignmentSession {
            client: self,
            workspace,
            comparisons: 0,
        })
    }
}

pub struct AlignmentSession<'a, A: StructureAligner, C: FormatConverter> {
    client: &'a AlignmentClient<A, C>,
    workspace: TempDir,
    comparisons: usize,
}

impl<A: StructureAligner, C: FormatConverter> AlignmentSession<'_, A, C> {
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// RMSD between a predicted model and its reference structure.
    pub fn align(&mut self, predicted: &Path, reference: &Path) -> Result<f64, FoldBenchError> {
        for path in [predicted, reference] {
            if !path.is_file() {
                return Err(FoldBenchError::MissingStructure(path.to_path_buf()));
            }
        }
        let first_format = StructureFormat::from_path(predicted)?;
        let second_format = StructureFormat::from_path(reference)?;

        self.comparisons += 1;
        let scratch = self
            .workspace
            .path()
            .join(format!("comparison-{}", self.comparisons));
        fs::create_dir_all(&scratch).map_err(|err| FoldBenchError::Filesystem(err.to_string()))?;

        let result = self.align_in(&scratch, predicted, reference, first_format, second_format);

        // Nothing from one comparison may be visible to the next.
        if let Err(err) = fs::remove_dir_all(&scratch) {
            debug!("failed to clear {}: {err}", scratch.display());
        }
        result
    }

    fn align_in(
        &self,
        scratch: &Path,
        predicted: &Path,
        reference: &Path,
        first_format: StructureFormat,
        second_format: StructureFormat,
    ) -> Result<f64, FoldBenchError> {
        let client = self.client;
        let (first, second) =
            match plan_conversion(first_format, second_format, client.native_format) {
                ConversionPlan::None => (predicted.to_path_buf(), reference.to_path_buf()),
                ConversionPlan::ConvertFirst(target) => (
                    self.convert(scratch, predicted, target)?,
                    reference.to_path_buf(),
                ),
                ConversionPlan::ConvertSecond(target) => (
                    predicted.to_path_buf(),
                    self.convert(scratch, reference, target)?,
                ),
            };

        let image = client.render_dir.as_ref().map(|dir| {
            let stem = predicted
                .file_stem()
                .and_then(|value| value.to_str())
                .unwrap_or("structure");
            dir.join(format!("{stem}_aligned.png"))
        });

        let rmsd = client
            .aligner
            .superpose(&first, &second, scratch, image.as_deref())?;
        if !rmsd.is_finite() {
            return Err(FoldBenchError::Alignment(format!(
                "non-finite RMSD for {}",
                predicted.display()
            )));
        }
        Ok(rmsd)
    }

    fn convert(
        &self,
        scratch: &Path,
        input: &Path,
        target: StructureFormat,
    ) -> Result<PathBuf, FoldBenchError> {
        let stem = input
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("structure");
        let output = scratch.join(format!("{stem}.{}", target.extension()));
        debug!("converting {} to {}", input.display(), output.display());
        self.client.converter.convert(input, &output)?;
        if !output.is_file() {
            return Err(FoldBenchError::Conversion(format!(
                "converter produced no output for {}",
                input.display()
            )));
        }
        Ok(output)
    }
}

/// PyMOL in command-line mode, driven through a generated `.pml` script.
#[derive(Debug, Clone)]
pub struct PymolAligner {
    pymol: Option<PathBuf>,
}

impl PymolAligner {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            pymol: explicit.or_else(|| find_in_path("pymol")),
        }
    }

    fn require_pymol(&self) -> Result<&PathBuf, FoldBenchError> {
        self.pymol
            .as_ref()
            .ok_or_else(|| FoldBenchError::MissingTool("pymol".to_string()))
    }
}

impl StructureAligner for PymolAligner {
    fn superpose(
        &self,
        first: &Path,
        second: &Path,
        workspace: &Path,
        image: Option<&Path>,
    ) -> Result<f64, FoldBenchError> {
        let pymol = self.require_pymol()?;
        let script_path = workspace.join("superpose.pml");
        fs::write(&script_path, pymol_script(first, second, image))
            .map_err(|err| FoldBenchError::Filesystem(err.to_string()))?;

        let args = vec![
            "-c".to_string(),
            "-q".to_string(),
            script_path.to_string_lossy().to_string(),
        ];
        let stdout = run_cmd(pymol, &args).map_err(FoldBenchError::Alignment)?;
        parse_rmsd(&stdout).ok_or_else(|| {
            FoldBenchError::Alignment(format!(
                "no RMSD reported for {} vs {}",
                first.display(),
                second.display()
            ))
        })
    }

    fn availability(&self) -> Result<(), FoldBenchError> {
        self.require_pymol().map(|_| ())
    }
}

fn pymol_script(first: &Path, second: &Path, image: Option<&Path>) -> String {
    let mut script = format!(
        "load {}, predicted\nload {}, reference\n\
         python\n\
         print(\"RMSD=%.6f\" % cmd.super(\"predicted\", \"reference\")[0])\n\
         python end\n",
        first.display(),
        second.display()
    );
    if let Some(image) = image {
        script.push_str(
            "hide everything\n\
             show cartoon, predicted\n\
             show cartoon, reference\n\
             color red, predicted\n\
             color blue, reference\n\
             zoom predicted or reference\n",
        );
        script.push_str(&format!(
            "png {}, width=800, height=600, dpi=300, ray=1\n",
            image.display()
        ));
    }
    script.push_str("delete all\n");
    script
}

pub fn parse_rmsd(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("RMSD="))
        .and_then(|value| value.trim().parse::<f64>().ok())
}

/// Open Babel `obabel` conversion.
#[derive(Debug, Clone)]
pub struct OpenBabelConverter {
    obabel: Option<PathBuf>,
}

impl OpenBabelConverter {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            obabel: explicit.or_else(|| find_in_path("obabel")),
        }
    }

    fn require_obabel(&self) -> Result<&PathBuf, FoldBenchError> {
        self.obabel
            .as_ref()
            .ok_or_else(|| FoldBenchError::MissingTool("obabel".to_string()))
    }
}

impl FormatConverter for OpenBabelConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), FoldBenchError> {
        let obabel = self.require_obabel()?;
        let args = vec![
            input.to_string_lossy().to_string(),
            "-O".to_string(),
            output.to_string_lossy().to_string(),
        ];
        run_cmd(obabel, &args)
            .map(|_| ())
            .map_err(FoldBenchError::Conversion)
    }

    fn availability(&self) -> Result<(), FoldBenchError> {
        self.require_obabel().map(|_| ())
    }
}

fn run_cmd(program: &Path, args: &[String]) -> Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| format!("{}: {err}", program.display()))?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        Err(format!("command failed: {}", program.display()))
    } else {
        Err(stderr)
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
