// termretro - Main Entry Point
//
// Loads a libretro core, hands it a game and plays it in the terminal until
// Ctrl+C. Any fatal error restores the terminal first, then prints a single
// `FATAL:` line and exits with status 1.

use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use termretro::{
    CoreHost, CoreModule, HeadlessPlatform, HostConfig, HostError, Platform, ShutdownToken,
    TerminalPlatform,
};

#[derive(Parser)]
#[command(name = "termretro")]
#[command(version, about = "Play libretro cores in a terminal", long_about = None)]
struct Cli {
    /// Host configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run without a display or keyboard
    #[arg(long)]
    headless: bool,

    /// Do not open the audio device
    #[arg(long)]
    mute: bool,

    /// Write log output to this file (default: termretro.log in the temp
    /// directory, or stderr with --headless)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Path to the libretro core (shared library)
    core: PathBuf,

    /// Path to the game file
    rom: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = init_logger(log_path(&cli).as_deref()) {
        eprintln!("FATAL: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Default log file while the terminal display owns the tty
const TERMINAL_LOG_FILE: &str = "termretro.log";

/// Where `log` output goes
///
/// The terminal display draws on the same tty as stderr in raw mode, so
/// without `--log-file` a terminal session logs to `termretro.log` in the
/// temp directory. Headless sessions keep stderr. FATAL lines are printed
/// after the terminal is restored and always reach stderr.
fn log_path(cli: &Cli) -> Option<PathBuf> {
    match &cli.log_file {
        Some(path) => Some(path.clone()),
        None if cli.headless => None,
        None => Some(std::env::temp_dir().join(TERMINAL_LOG_FILE)),
    }
}

/// Route `log` output to stderr or a file; RUST_LOG overrides the level
fn init_logger(log_file: Option<&Path>) -> Result<(), String> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("failed to open log file {}: {}", path.display(), e))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn run(cli: &Cli) -> Result<(), HostError> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::load_from_file(path)?,
        None => HostConfig::default(),
    };
    if cli.mute {
        config.audio.enabled = false;
    }

    let shutdown = ShutdownToken::new();
    if let Err(e) = shutdown.install_signal_handler() {
        log::warn!("failed to install signal handler: {}", e);
    }

    let module = CoreModule::open(&cli.core)?;

    if cli.headless {
        play(module, HeadlessPlatform, config, shutdown, &cli.rom)
    } else {
        play(module, TerminalPlatform, config, shutdown, &cli.rom)
    }
}

fn play<P: Platform>(
    module: CoreModule,
    platform: P,
    config: HostConfig,
    shutdown: ShutdownToken,
    rom: &Path,
) -> Result<(), HostError> {
    let mut host = CoreHost::new(module, platform, config, shutdown)?;
    let result = host.execute(rom);

    // Restore the terminal before anything is printed
    host.shutdown();
    result
}
