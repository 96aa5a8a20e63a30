use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_foldbench::align::{OpenBabelConverter, PymolAligner};
use kira_foldbench::app::{App, ProgressSink, ScanOptions, summarize_table};
use kira_foldbench::config::{ConfigLoader, ResolvedConfig};
use kira_foldbench::error::FoldBenchError;
use kira_foldbench::output::{ConsoleOutput, JsonOutput, OutputMode};
use kira_foldbench::scan::find_table;

#[derive(Parser)]
#[command(name = "kira-foldbench")]
#[command(about = "Merge AlphaFold 3, Protenix and Chai-1 metrics into one benchmark table")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Scan a results directory and update the benchmark table")]
    Scan(ScanArgs),
    #[command(about = "Print mean metrics per tool, overall and per difficulty")]
    Summary(SummaryArgs),
}

#[derive(Args)]
struct ScanArgs {
    results_dir: Option<PathBuf>,

    #[arg(long)]
    table: Option<PathBuf>,

    #[arg(long, help = "Write a PNG of every superposition into this directory")]
    render_dir: Option<PathBuf>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct SummaryArgs {
    table: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FoldBenchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FoldBenchError) -> u8 {
    match error {
        FoldBenchError::TableRead { .. }
        | FoldBenchError::TableWrite { .. }
        | FoldBenchError::TableMissing(_)
        | FoldBenchError::TableFormat(_) => 2,
        FoldBenchError::ConfigRead(_) | FoldBenchError::ConfigParse(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, &mut config, output_mode),
        Commands::Summary(args) => run_summary(args, &config, output_mode),
    }
}

fn run_scan(
    args: ScanArgs,
    config: &mut ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let results_dir = args
        .results_dir
        .or_else(|| config.results_dir.clone())
        .ok_or_else(|| miette::Report::msg("results directory required (argument or config)"))?;
    if args.render_dir.is_some() {
        config.alignment.render_dir = args.render_dir;
    }
    let options = ScanOptions {
        results_dir,
        table: args.table.or_else(|| config.table.clone()),
        dry_run: args.dry_run,
    };

    let aligner = PymolAligner::new(config.alignment.pymol.clone());
    let converter = OpenBabelConverter::new(config.alignment.obabel.clone());
    let app = App::new(config, aligner, converter);

    match output_mode {
        OutputMode::Json => {
            let report = app.scan(&options, &JsonOutput)?;
            JsonOutput::print_scan(&report).into_diagnostic()?;
        }
        OutputMode::Console => {
            let console = ConsoleOutput::new(config.number_format.clone());
            let sink: &dyn ProgressSink = &console;
            let report = app.scan(&options, sink)?;
            console.print_scan(&report);
        }
    }
    Ok(())
}

fn run_summary(
    args: SummaryArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let table = match args.table.or_else(|| config.table.clone()) {
        Some(table) => table,
        None => {
            let dir = config
                .results_dir
                .clone()
                .ok_or_else(|| miette::Report::msg("table path required (argument or config)"))?;
            find_table(&dir)?
        }
    };

    let summary = summarize_table(config, &table)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Console => {
            ConsoleOutput::new(config.number_format.clone()).print_summary(&summary)
        }
    }
    Ok(())
}
