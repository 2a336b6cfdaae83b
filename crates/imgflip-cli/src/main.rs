//! imgflip - flip images with compute kernels
//!
//! Runs horizontal, vertical and diagonal flips on the CPU worker grid or
//! on the GPU, once or as a per-frame loop.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use imgflip_core::FlipMode;

mod commands;

#[derive(Parser)]
#[command(name = "imgflip")]
#[command(author, version, about = "Flip images with CPU/GPU compute kernels")]
#[command(long_about = "
Flips images across the x axis, the y axis or the diagonal by dispatching
per-pixel remap kernels over a grid of 8x8 blocks.

Enabled flips run in the order x, y, diagonal unless --mode gives an
explicit order.

Examples:
  imgflip flip in.png -o out.png -x          # Mirror horizontally
  imgflip flip in.png -o out.png -x -y       # Rotate 180 degrees
  imgflip flip in.png -o out.png --mode diag,x
  imgflip --backend wgpu flip in.png -o out.png -d
  imgflip run in.png -o out.png -d --frames 60
  imgflip backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Compute backend: auto, cpu, wgpu
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// YAML config with flip toggles, backend and pool budget
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Flip an image once
    #[command(visible_alias = "f")]
    Flip(FlipArgs),

    /// Re-run the flip every frame, as a render loop would
    Run(RunArgs),

    /// List compute backends
    Backends,
}

/// Flip selection shared by `flip` and `run`.
#[derive(Args, Clone)]
struct FlipSelect {
    /// Flip across the x axis
    #[arg(short = 'x', long)]
    flip_x: bool,

    /// Flip across the y axis
    #[arg(short = 'y', long)]
    flip_y: bool,

    /// Flip across the diagonal (transpose)
    #[arg(short = 'd', long)]
    flip_diag: bool,

    /// Explicit ordered modes, e.g. `diag,x` (overrides the toggles)
    #[arg(short, long, value_delimiter = ',')]
    mode: Vec<FlipMode>,
}

/// Arguments for the `flip` command.
#[derive(Args)]
struct FlipArgs {
    /// Input PNG
    input: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    select: FlipSelect,
}

/// Arguments for the `run` command.
#[derive(Args)]
struct RunArgs {
    /// Input PNG
    input: PathBuf,

    /// Output PNG (last presented frame)
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    select: FlipSelect,

    /// Number of frames to run
    #[arg(short, long, default_value = "1")]
    frames: u64,
}

/// Global options passed to every command.
pub struct Globals {
    pub verbose: u8,
    pub backend: Option<String>,
    pub config: Option<PathBuf>,
}

fn init_logging(verbose: u8, log: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().context("Log path has no file name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(cli.verbose, cli.log.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let globals = Globals {
        verbose: cli.verbose,
        backend: cli.backend,
        config: cli.config,
    };

    match cli.command {
        Commands::Flip(args) => commands::flip::run(args, &globals),
        Commands::Run(args) => commands::run::run(args, &globals),
        Commands::Backends => commands::backends::run(&globals),
    }
}
