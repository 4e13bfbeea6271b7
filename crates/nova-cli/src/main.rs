use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nova_minimize::{
    correct_types_in, minimize, MinimizeConfig, MinimizeReport, TypeChecker, TypeCorrections,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nova", version, about = "Nova Java program minimizer")]
struct Cli {
    /// Increase log verbosity (`-v` debug, `-vv` trace); `NOVA_LOG` overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reduce a source tree to what the target methods need
    Minimize(MinimizeArgs),
    /// Compile every file under a directory and print type corrections
    TypeCorrect(TypeCorrectArgs),
}

#[derive(Args)]
struct MinimizeArgs {
    /// Config file (defaults to `nova-minimize.toml` in the root, if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory scanned for `.java` sources
    #[arg(long)]
    root: Option<PathBuf>,
    /// Directory the minimized sources are written to
    #[arg(long)]
    output: Option<PathBuf>,
    /// Target member, e.g. `com.example.Foo#bar(int, String)`; repeatable
    #[arg(long = "target", value_name = "SIGNATURE")]
    targets: Vec<String>,
    #[command(flatten)]
    checker: CheckerArgs,
    /// Skip the type checker
    #[arg(long)]
    no_check: bool,
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TypeCorrectArgs {
    /// Root of the sources to check
    root: PathBuf,
    #[command(flatten)]
    checker: CheckerArgs,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckerArgs {
    /// Type checker executable
    #[arg(long, value_name = "PROGRAM")]
    checker: Option<PathBuf>,
    /// Per-file checker timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("NOVA_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed when running under a test harness.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Minimize(args) => {
            let config = resolve_config(&args)?;
            let report = minimize(&config)
                .with_context(|| format!("minimizing {}", config.root.display()))?;
            if args.json {
                print_json(&report)?;
            } else {
                print_report(&report, &config);
            }
            Ok(0)
        }
        Command::TypeCorrect(args) => {
            let mut checker = nova_minimize::CheckerConfig::default();
            args.checker.apply(&mut checker);
            let corrections = correct_types_in(&args.root, &TypeChecker::from_config(&checker))?;
            if args.json {
                print_json(&corrections)?;
            } else {
                print_corrections(&corrections);
            }
            Ok(0)
        }
    }
}

impl CheckerArgs {
    fn apply(&self, config: &mut nova_minimize::CheckerConfig) {
        if let Some(program) = &self.checker {
            config.program = program.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
    }
}

/// The config file (explicit or discovered), with command-line flags on top.
fn resolve_config(args: &MinimizeArgs) -> Result<MinimizeConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => MinimizeConfig::discover(args.root.as_deref().unwrap_or(Path::new("."))),
    };
    let mut config = match &path {
        Some(path) => MinimizeConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MinimizeConfig::default(),
    };
    tracing::debug!(target: "nova.cli", config = ?path, "resolved configuration file");

    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if !args.targets.is_empty() {
        config.targets = args.targets.clone();
    }
    args.checker.apply(&mut config.checker);
    if args.no_check {
        config.checker.enabled = false;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_report(report: &MinimizeReport, config: &MinimizeConfig) {
    let kept = report.kept_files().count();
    println!(
        "minimized: {kept} of {} files written to {}",
        report.files.len(),
        config.output.display()
    );
    for target in &report.targets {
        println!("  target: {target}");
    }
    println!(
        "  used: {} classes, {} methods, {} fields",
        report.used_classes.len(),
        report.used_methods.len(),
        report.used_fields.len()
    );
    if report.parse_errors > 0 {
        println!("  parse errors: {}", report.parse_errors);
    }
    for class in &report.missing_classes {
        println!("  missing class: {class}");
    }
    for member in &report.unresolved {
        println!("  unresolved: {}.{}", member.owner, member.name);
    }
    if !report.type_corrections.is_empty() {
        print_corrections(&report.type_corrections);
    }
}

fn print_corrections(corrections: &TypeCorrections) {
    for (incorrect, correct) in corrections.iter() {
        println!("correction: {incorrect} -> {correct}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn minimize_args(argv: &[&str]) -> MinimizeArgs {
        let argv = ["nova", "minimize"].iter().chain(argv).copied();
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Minimize(args) => args,
            Command::TypeCorrect(_) => panic!("expected the minimize command"),
        }
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "root = \"src\"\ntargets = [\"a.B#c()\"]\n\n[checker]\ntimeout_ms = 5\n",
        )
        .unwrap();

        let args = minimize_args(&[
            "--config",
            path.to_str().unwrap(),
            "--output",
            "elsewhere",
            "--target",
            "a.B#d(int)",
            "--no-check",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.root, dir.path().join("src"));
        assert_eq!(config.output, PathBuf::from("elsewhere"));
        assert_eq!(config.targets, vec!["a.B#d(int)".to_string()]);
        assert_eq!(config.checker.timeout_ms, 5);
        assert!(!config.checker.enabled);
    }

    #[test]
    fn config_is_discovered_in_the_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(nova_minimize::CONFIG_FILE_NAME),
            "targets = [\"a.B#c()\"]\nmax_stub_rounds = 0\n",
        )
        .unwrap();

        let args = minimize_args(&["--root", dir.path().to_str().unwrap()]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.targets, vec!["a.B#c()".to_string()]);
        assert_eq!(config.max_stub_rounds, 0);
        assert_eq!(config.root, dir.path().to_path_buf());
    }

    #[test]
    fn checker_timeout_is_bounded_by_the_flag() {
        let cli =
            Cli::try_parse_from(["nova", "type-correct", "out", "--timeout-ms", "10"]).unwrap();
        let Command::TypeCorrect(args) = cli.command else {
            panic!("expected the type-correct command");
        };
        let mut checker = nova_minimize::CheckerConfig::default();
        args.checker.apply(&mut checker);
        assert_eq!(checker.timeout_ms, 10);
        assert_eq!(
            TypeChecker::from_config(&checker).timeout(),
            Duration::from_millis(10)
        );
    }
}
