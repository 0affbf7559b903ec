use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use linnet_analysis::AnalysisConfig;
use miden_diagnostics::term::termcolor::ColorChoice;
use miden_diagnostics::{CodeMap, DefaultEmitter, DiagnosticsHandler};

/// Symbolic analysis of ideal linear electrical circuits.
///
/// Each netlist is analysed independently and rendered to a GNU Octave
/// script with the requested transfer functions.
#[derive(Debug, Parser)]
#[command(name = "linnet", version)]
struct Cli {
    /// Netlist files to analyse
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for the generated scripts (default: next to each input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the generated scripts to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Lower the symbolic-constant budget below the built-in ceiling
    #[arg(long)]
    max_constants: Option<usize>,

    /// Override the node capacity
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Override the device capacity
    #[arg(long)]
    max_devices: Option<usize>,
}

impl Cli {
    fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        if let Some(max) = self.max_constants {
            // The bitset width is a hard ceiling.
            config.max_constants = max.min(config.max_constants);
        }
        if let Some(max) = self.max_nodes {
            config.max_nodes = max;
        }
        if let Some(max) = self.max_devices {
            config.max_devices = max;
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut failed = false;
    for file in &cli.files {
        // Files are processed strictly sequentially, each with fresh state.
        if let Err(err) = process(file, &cli) {
            log::error!("{}: {err:#}", file.display());
            failed = true;
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn process(path: &Path, cli: &Cli) -> anyhow::Result<()> {
    let codemap = Arc::new(CodeMap::new());
    let emitter = Arc::new(DefaultEmitter::new(ColorChoice::Auto));
    let diagnostics = DiagnosticsHandler::new(Default::default(), codemap.clone(), emitter);

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let script = linnet::compile(&diagnostics, codemap, &source, cli.config())?;

    if cli.stdout {
        print!("{script}");
        return Ok(());
    }
    let out = match &cli.output {
        Some(dir) => dir.join(path.file_stem().unwrap_or_default()).with_extension("m"),
        None => path.with_extension("m"),
    };
    std::fs::write(&out, script)
        .with_context(|| format!("failed to write {}", out.display()))?;
    log::info!("{} -> {}", path.display(), out.display());
    Ok(())
}
