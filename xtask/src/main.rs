use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "reservation_lambda";
const LAMBDA_BIN: &str = "reservation_api";
const BENCH_PACKAGE: &str = "reservation_core";
const BENCH_NAME: &str = "listing";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the reservation service workspace",
    long_about = "CI checks, benchmarks and Lambda packaging for the reservation\n\
                  core library and its API Gateway handler."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests, benchmarks)
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run the listing benchmarks
    Bench {
        /// Save results under this Criterion baseline name
        #[arg(long)]
        save_baseline: Option<String>,
        /// Compare against a previously saved baseline
        #[arg(long, conflicts_with = "save_baseline")]
        baseline: Option<String>,
    },
    /// Build the API binary and zip it as a `provided.al2023` bootstrap
    LambdaPackage {
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip archive
        #[arg(long, env = "LAMBDA_DIST_DIR", default_value = "infra/dist")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy and tests
    Check,
    /// Benchmarks only
    Bench,
    /// Check followed by bench
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

type TaskResult = Result<(), String>;

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> TaskResult {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to execute cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn ci_check() -> TaskResult {
    step("Check formatting");
    cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;

    step("Test reservation_core");
    cargo(&["test", "-p", BENCH_PACKAGE])?;

    step("Test reservation_lambda");
    cargo(&["test", "-p", LAMBDA_PACKAGE])
}

fn bench(save_baseline: Option<&str>, baseline: Option<&str>) -> TaskResult {
    step("Run listing benchmarks");
    let mut args = vec!["bench", "-p", BENCH_PACKAGE, "--bench", BENCH_NAME];
    match (save_baseline, baseline) {
        (Some(name), _) => args.extend(["--", "--save-baseline", name]),
        (None, Some(name)) => args.extend(["--", "--baseline", name]),
        (None, None) => {}
    }
    cargo(&args)
}

fn lambda_package(target: &str, profile: BuildProfile, dist_dir: &Path) -> TaskResult {
    ensure_target_installed(target);

    step("Build Lambda binary");
    let mut args = vec!["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_BIN, "--target", target];
    if let Some(flag) = profile.cargo_flag() {
        args.push(flag);
    }
    cargo(&args)?;

    step("Package bootstrap zip");
    let binary = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(LAMBDA_BIN);
    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("failed to create '{}': {error}", dist_dir.display()))?;
    let zip_path = dist_dir.join(format!("{LAMBDA_BIN}.zip"));
    write_bootstrap_zip(&binary, &zip_path)?;

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
    Ok(())
}

/// Warns rather than fails when rustup is unavailable.
fn ensure_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) if value.status.success() => value,
        _ => {
            eprintln!("warning: could not list installed rust targets; skipping preflight");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        eprintln!("warning: target `{target}` is not installed; try `rustup target add {target}`");
    }
}

fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> TaskResult {
    let binary = fs::read(binary_path)
        .map_err(|error| format!("expected lambda binary at '{}': {error}", binary_path.display()))?;
    let file = fs::File::create(zip_path)
        .map_err(|error| format!("failed to create '{}': {error}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("failed to start bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("failed to write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("failed to finish zip: {error}"))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Check => ci_check(),
            CiJob::Bench => bench(None, None),
            CiJob::All => ci_check().and_then(|()| bench(None, None)),
        },
        Commands::Bench {
            save_baseline,
            baseline,
        } => bench(save_baseline.as_deref(), baseline.as_deref()),
        Commands::LambdaPackage {
            target,
            profile,
            dist_dir,
        } => lambda_package(&target, profile, &dist_dir),
    };

    match result {
        Ok(()) => {
            eprintln!("\nDone.");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("\nerror: {message}");
            ExitCode::FAILURE
        }
    }
}
