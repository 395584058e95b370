// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use filepath_checker::spreadsheet::rows::count_rows;
use filepath_checker::utils::logging::{format_error, format_info, format_summary};
use filepath_checker::{
    Config, JsonExporter, PipelineCoordinator, ProgressSenders, ProgressTracker, RunRequest,
    Validator, WorkbookPackage, progress_channels,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "filepath_checker")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Checks that the file paths listed in a spreadsheet column exist", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every path in one column and log the missing ones
    Check {
        /// Workbook to read (.xlsx)
        spreadsheet: PathBuf,

        /// Column letter(s) holding the paths, e.g. C or AB
        #[arg(short = 'C', long, env = "FILEPATH_CHECKER_COLUMN")]
        column: String,

        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,

        #[arg(short, long, value_name = "NUM")]
        workers: Option<usize>,

        #[arg(long)]
        preserve_order: bool,

        /// Also write the run report as JSON into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,

        #[arg(long)]
        no_progress: bool,
    },

    /// Show what would be read from a workbook
    Inspect { spreadsheet: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(cli.color);
    filepath_checker::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Filepath Checker");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Check {
            spreadsheet,
            column,
            log_dir,
            workers,
            preserve_order,
            export,
            pretty,
            no_progress,
        } => {
            let options = CheckOptions {
                log_dir,
                workers,
                preserve_order,
                export,
                pretty,
                progress: !no_progress,
                colored: cli.color,
            };
            cmd_check(config, spreadsheet, column, options).await?;
        }
        Commands::Inspect { spreadsheet } => {
            cmd_inspect(spreadsheet).await?;
        }
    }

    Ok(())
}

struct CheckOptions {
    log_dir: Option<PathBuf>,
    workers: Option<usize>,
    preserve_order: bool,
    export: Option<PathBuf>,
    pretty: bool,
    progress: bool,
    colored: bool,
}

async fn cmd_check(
    mut config: Config,
    spreadsheet: PathBuf,
    column: String,
    options: CheckOptions,
) -> Result<()> {
    Validator::validate_spreadsheet_path(&spreadsheet)?;

    if let Some(dir) = options.log_dir {
        Validator::validate_output_directory(&dir)?;
        config.log.directory = Some(dir);
    }
    if let Some(workers) = options.workers {
        Validator::validate_workers(workers)?;
        config.verification.parallel_workers = Some(workers);
    }
    if options.preserve_order {
        config.verification.preserve_order = true;
    }
    if let Some(dir) = &options.export {
        Validator::validate_output_directory(dir)?;
    }

    let coordinator = PipelineCoordinator::new(config);

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the run");
            cancel.cancel();
        }
    });

    let (senders, tracker) = if options.progress {
        let (senders, receivers) = progress_channels();
        let tracker = tokio::spawn(ProgressTracker::new(options.colored).drive(receivers));
        (senders, Some(tracker))
    } else {
        (ProgressSenders::none(), None)
    };

    let result = coordinator
        .run(RunRequest::new(&spreadsheet, column), senders)
        .await;

    if let Some(tracker) = tracker
        && let Err(e) = tracker.await
    {
        warn!("Progress display stopped unexpectedly: {}", e);
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            return Err(e).context("Filepath check failed");
        }
    };

    println!("{}", format_summary(&report));

    if let Some(dir) = options.export {
        let exporter = JsonExporter::new(dir)?;
        let path = exporter.export_report(&report, options.pretty)?;
        println!("{}", format_info(&format!("Report written to {}", path.display())));
    }

    Ok(())
}

async fn cmd_inspect(spreadsheet: PathBuf) -> Result<()> {
    Validator::validate_spreadsheet_path(&spreadsheet)?;

    let details = tokio::task::spawn_blocking(move || -> filepath_checker::Result<_> {
        let mut package = WorkbookPackage::open(&spreadsheet)?;
        let shared_strings = package.load_shared_strings()?;
        let rows = count_rows(package.open_sheet()?)?;
        Ok((
            package.sheet_name().to_string(),
            package.sheet_part().to_string(),
            rows,
            shared_strings.len(),
        ))
    })
    .await
    .context("Inspect task failed")??;

    let (sheet_name, sheet_part, rows, shared) = details;
    println!("Sheet: {} ({})", sheet_name, sheet_part);
    println!("Rows: {}", rows);
    println!("Shared strings: {}", shared);

    Ok(())
}
