use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use framedump::{
    DEFAULT_BASE_NAME, DEFAULT_FRAME_BUDGET, ExportFailurePolicy, FfmpegLogLevel, PipelineDriver,
    PipelineOptions, ProgressCallback, ProgressInfo, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  framedump input.mp4\n  framedump input.mp4 --frames 20 --output-dir frames --prefix clip\n  framedump input.mkv --pipeline-depth 4 --progress --log-level error";

#[derive(Debug, Parser)]
#[command(
    name = "framedump",
    version,
    about = "Dump the first frames of a video as PGM (luma) and PPM (RGB) files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Media file to decode.
    input: Option<PathBuf>,

    /// Number of frames to export.
    #[arg(short = 'n', long, default_value_t = DEFAULT_FRAME_BUDGET, value_parser = clap::value_parser!(u64).range(1..))]
    frames: u64,

    /// Directory the rasters are written into (created if missing).
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File name stem of the rasters.
    #[arg(long, default_value = DEFAULT_BASE_NAME)]
    prefix: String,

    /// Keep going when a raster cannot be written.
    #[arg(long)]
    continue_on_error: bool,

    /// Export on a worker thread behind a queue of this many frames.
    #[arg(long)]
    pipeline_depth: Option<usize>,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Show debug logging. RUST_LOG takes precedence.
    #[arg(short, long)]
    verbose: bool,

    /// Show a progress bar over the frame budget.
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn pipeline_options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new()
            .with_frame_budget(self.frames)
            .with_output_directory(&self.output_dir)
            .with_base_name(self.prefix.clone());

        if self.continue_on_error {
            options = options.with_export_failure_policy(ExportFailurePolicy::Continue);
        }
        if let Some(depth) = self.pipeline_depth {
            options = options.with_pipeline_depth(depth);
        }
        options
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        self.bar.set_message(format!("frame {}", info.frame_number));
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn report(summary: &RunSummary, cli: &Cli) {
    if summary.export_failures > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} frame(s) could not be written", summary.export_failures).yellow()
        );
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Exported {} frame(s) to {} ({})",
            summary.frames_exported,
            cli.output_dir.display(),
            summary.stop_reason
        )
        .green()
    );
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(level) = cli.log_level {
        level.apply();
    }

    let mut options = cli.pipeline_options();
    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new(cli.frames)?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let summary = PipelineDriver::new(options).run_path(cli.input.as_deref())?;

    if let Some(progress) = progress {
        progress.bar.finish_with_message("done");
    }
    report(&summary, &cli);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
