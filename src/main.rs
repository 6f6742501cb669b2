use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quake_log_parser::app::{Config, OutputConfig};
use quake_log_parser::gamelog::{self, Matches};

const EXIT_USAGE: i32 = 1;
const EXIT_PARSE: i32 = 1;
const EXIT_OPEN: i32 = 2;
const EXIT_OUTPUT: i32 = 4;

/// Quake log parser - per-match kill statistics as JSON
#[derive(Parser, Debug)]
#[command(name = "qlp")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "qlp [OPTIONS] [FILE]")]
struct Cli {
    /// Game log to parse
    file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "QLP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write single-line JSON
    #[arg(long)]
    compact: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to ~/.config/quake-log-parser/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Error plus the process exit code it maps to
#[derive(Debug)]
struct Failure {
    code: i32,
    error: anyhow::Error,
}

impl Failure {
    fn new(code: i32, error: anyhow::Error) -> Self {
        Self { code, error }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(failure) = run(cli) {
        eprintln!("Error: {:#}", failure.error);
        std::process::exit(failure.code);
    }
}

fn run(cli: Cli) -> Result<(), Failure> {
    // 引数なしはヘルプを表示して終了（設定エラーより優先）
    let Some(path) = cli.file.as_deref() else {
        return Err(usage_failure());
    };

    let mut config = match &cli.config {
        Some(config_path) => Config::load_from(config_path),
        None => Config::load(),
    }
    .map_err(|e| Failure::new(EXIT_USAGE, e))?;
    apply_overrides(&mut config, &cli);

    // ログ初期化
    init_logging(&config.log_level).map_err(|e| Failure::new(EXIT_USAGE, e))?;

    let matches = parse_file(path)?;
    info!(matches = matches.len(), path = %path.display(), "Parsed log");

    write_report(&matches, &config.output, cli.output.as_deref())
        .map_err(|e| Failure::new(EXIT_OUTPUT, e))
}

fn usage_failure() -> Failure {
    let error = match Cli::command().print_help() {
        Ok(()) => anyhow::anyhow!("missing FILE argument"),
        Err(e) => anyhow::Error::new(e).context("Failed to print usage"),
    };
    Failure::new(EXIT_USAGE, error)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.compact {
        config.output.pretty = false;
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    // stdoutはJSON専用なのでログはstderrへ
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Open and parse a log file. The file is closed on every return path.
fn parse_file(path: &Path) -> Result<Matches, Failure> {
    let file = File::open(path).map_err(|e| {
        Failure::new(EXIT_OPEN, anyhow::anyhow!("Failed to open file: {}", e))
    })?;
    debug!(path = %path.display(), "Opened log");

    gamelog::parse_log(BufReader::new(file)).map_err(|e| {
        Failure::new(EXIT_PARSE, anyhow::anyhow!("Failed to parse file: {}", e))
    })
}

fn write_report(matches: &Matches, output: &OutputConfig, dest: Option<&Path>) -> Result<()> {
    match dest {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render(matches, output, &mut writer)?;
            writer.flush().context("Failed to write game data")?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            render(matches, output, &mut writer)?;
            writer.flush().context("Failed to write game data")?;
        }
    }
    Ok(())
}

fn render<W: Write>(matches: &Matches, output: &OutputConfig, writer: &mut W) -> Result<()> {
    matches
        .write_json(&mut *writer, output.indent())
        .context("Failed to marshal game data")?;
    if output.pretty {
        writeln!(writer)?;
    }
    Ok(())
}
