use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for termretro")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI steps (fmt, clippy, build, features, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only the unit tests of these modules
        #[arg(long = "module", value_name = "MODULE")]
        modules: Vec<String>,
    },
    /// Check the crate with audio and gamepad support switched off
    Features,
    /// Run the video benchmarks
    Bench,
    /// Play a game with a core
    Play {
        /// Path to the libretro core
        core: String,
        /// Path to the game file
        rom: String,
        /// Build in release mode
        #[arg(long)]
        release: bool,
        /// Do not open the audio device
        #[arg(long)]
        mute: bool,
        /// Run without display or keyboard
        #[arg(long)]
        headless: bool,
    },
    /// Pre-commit hook (fmt, clippy, features, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

/// One step of a check pipeline
#[derive(Clone, Copy)]
enum Step {
    FmtCheck,
    Clippy,
    Build,
    Features,
    Test,
}

impl Step {
    fn name(self) -> &'static str {
        match self {
            Step::FmtCheck => "Format Check",
            Step::Clippy => "Clippy",
            Step::Build => "Build",
            Step::Features => "Features",
            Step::Test => "Test",
        }
    }

    fn run(self) -> Result<()> {
        match self {
            Step::FmtCheck => run_fmt(true),
            Step::Clippy => run_clippy(false),
            Step::Build => run_build(false),
            Step::Features => run_features(),
            Step::Test => run_test(false, false, &[]),
        }
    }
}

/// Modules with their own unit tests
const MODULES: [&str; 6] = ["abi", "loader", "video", "audio", "input", "host"];

/// Feature sets that must keep compiling; CI runners lack ALSA and udev
/// headers, so only the first one runs there
const FEATURE_SETS: [&[&str]; 3] = [
    &["--no-default-features"],
    &["--no-default-features", "--features", "audio"],
    &["--no-default-features", "--features", "gamepad"],
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => pipeline(
            "CI",
            &[Step::FmtCheck, Step::Clippy, Step::Build, Step::Features, Step::Test],
            verbose,
        ),
        Commands::Check { verbose } => {
            pipeline("Quick Checks", &[Step::FmtCheck, Step::Clippy], verbose)
        }
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            modules,
        } => run_test(doc, ignored, &modules),
        Commands::Features => run_features(),
        Commands::Bench => execute(cargo("bench")),
        Commands::Play {
            core,
            rom,
            release,
            mute,
            headless,
        } => run_play(&core, &rom, release, mute, headless),
        Commands::PreCommit => pipeline(
            "Pre-commit Checks",
            &[Step::FmtCheck, Step::Clippy, Step::Features, Step::Test],
            false,
        ),
        Commands::InstallHooks => install_hooks(),
    }
}

fn on_ci() -> bool {
    std::env::var("CI").is_ok()
}

/// `cargo <subcommand>`
fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    cmd
}

/// `cargo <subcommand>` with the feature set this machine can build
fn cargo_with_features(subcommand: &str) -> Command {
    let mut cmd = cargo(subcommand);
    cmd.arg(if on_ci() {
        "--no-default-features"
    } else {
        "--all-features"
    });
    cmd
}

fn pipeline(title: &str, steps: &[Step], verbose: bool) -> Result<()> {
    println!("{}", format!("=== {} ===", title).bold().blue());
    let start = Instant::now();

    for step in steps {
        print!("{} {} ... ", "→".blue(), step.name());
        let step_start = Instant::now();

        if let Err(e) = step.run() {
            println!("{}", "✗".red().bold());
            return Err(e);
        }

        if verbose {
            println!(
                "{} ({:.2}s)",
                "✓".green().bold(),
                step_start.elapsed().as_secs_f64()
            );
        } else {
            println!("{}", "✓".green().bold());
        }
    }

    println!(
        "\n{} {}",
        format!("✓ {} passed in", title).green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");
    if check {
        cmd.args(["--", "--check"]);
    }
    execute(cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo_with_features("clippy");
    cmd.arg("--all-targets");
    if fix {
        cmd.arg("--fix");
    } else {
        cmd.args(["--", "-D", "warnings"]);
    }
    execute(cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = cargo("build");
    if release {
        cmd.arg("--release");
    }
    execute(cmd)
}

fn run_test(doc: bool, ignored: bool, modules: &[String]) -> Result<()> {
    let test_command = |filter: Option<String>| {
        let mut cmd = cargo_with_features("test");
        if doc {
            cmd.arg("--doc");
        }
        if let Some(filter) = filter {
            cmd.arg("--lib").arg(filter);
        }
        if ignored {
            cmd.args(["--", "--ignored"]);
        }
        cmd
    };

    if doc || modules.is_empty() {
        return execute(test_command(None));
    }

    if let Some(unknown) = modules.iter().find(|m| !MODULES.contains(&m.as_str())) {
        anyhow::bail!(
            "Unknown module '{}' (expected one of: {})",
            unknown,
            MODULES.join(", ")
        );
    }

    let failed: Vec<&str> = modules
        .iter()
        .filter(|module| {
            println!("{} Running {} tests...", "→".blue(), module.bold());
            let passed = execute(test_command(Some(format!("{}::", module)))).is_ok();
            if passed {
                println!("{} {} tests passed\n", "✓".green(), module);
            } else {
                println!("{} {} tests failed\n", "✗".red(), module);
            }
            !passed
        })
        .map(String::as_str)
        .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Module tests failed: {}", failed.join(", "))
    }
}

fn run_features() -> Result<()> {
    let count = if on_ci() { 1 } else { FEATURE_SETS.len() };

    for args in &FEATURE_SETS[..count] {
        let mut cmd = cargo("check");
        cmd.arg("--all-targets").args(*args);
        execute(cmd)?;
    }
    Ok(())
}

fn run_play(core: &str, rom: &str, release: bool, mute: bool, headless: bool) -> Result<()> {
    for (what, path) in [("Core", core), ("Game", rom)] {
        if !Path::new(path).exists() {
            anyhow::bail!("{} file not found: {}", what, path);
        }
    }

    let is_library = matches!(
        Path::new(core).extension().and_then(|e| e.to_str()),
        Some("so" | "dylib" | "dll")
    );
    if !is_library {
        println!(
            "{} {} does not look like a shared library",
            "⚠".yellow().bold(),
            core
        );
    }

    println!(
        "{} {} + {} ({})",
        "→".blue(),
        core.cyan(),
        rom.cyan(),
        if release { "release" } else { "debug" }
    );

    let mut cmd = cargo("run");
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--");
    if mute {
        cmd.arg("--mute");
    }
    if headless {
        cmd.arg("--headless");
    }
    cmd.arg(core).arg(rom);

    let start = Instant::now();
    execute(cmd)?;
    println!(
        "\n{} Session ended after {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    let hook_path = Path::new(".git/hooks/pre-commit");
    fs::write(hook_path, "#!/bin/sh\nset -e\ncargo x pre-commit\n")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(hook_path, fs::Permissions::from_mode(0o755))?;
    }

    println!("{} pre-commit hook installed", "✓".green());
    Ok(())
}

fn execute(mut cmd: Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("{:?} failed: {}", cmd, status);
    }
    Ok(())
}
