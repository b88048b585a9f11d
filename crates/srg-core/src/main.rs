//! Snap refresh guard CLI.
//!
//! The entry point for srg, handling:
//! - Soft and hard "nothing running" checks for a snap descriptor
//! - Waiting for a snap's run inhibition to clear
//! - Inspecting the per-security-tag process census
//! - Showing the resolved configuration

use clap::{ArgGroup, Args, Parser, Subcommand};
use serde_json::json;
use srg_common::{OutputFormat, SecurityTag, SnapInfo, SnapInfoError};
use srg_config::{load_config, ConfigError, ResolvedConfig};
use srg_core::check::{CheckError, CheckPolicy, RefreshChecker};
use srg_core::collect::pids::{CensusError, PidsCgroup, ProcessCensus};
use srg_core::exit_codes::{from_io_error, ExitCode};
use srg_core::inhibit::{HintError, RunInhibitStore};
use srg_core::lock::{LockDir, LockError};
use srg_core::logging::{event_names, init_logging, LogConfig, LogLevel};
use srg_core::wait::{SessionCapabilities, WaitCoordinator, WaitError, WaitOptions, ZenityLauncher};
use std::path::PathBuf;
use tracing::{debug, error};

/// Snap refresh guard - busy checks and run-inhibition waiting
#[derive(Parser)]
#[command(name = "srg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.json (overrides SRG_CONFIG and the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that nothing of a snap is running
    Check(CheckArgs),

    /// Wait until a snap is no longer inhibited
    Wait(WaitArgs),

    /// List live processes of one security tag
    Pids(PidsArgs),

    /// Show the resolved configuration
    Config,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("policy").required(true).args(["soft", "hard"])))]
struct CheckArgs {
    /// Early advisory check; services are ignored
    #[arg(long)]
    soft: bool,

    /// Late authoritative check; only enduring services are ignored
    #[arg(long)]
    hard: bool,

    /// Snap descriptor (JSON)
    snap_info: PathBuf,
}

#[derive(Args, Debug)]
struct WaitArgs {
    /// Snap name
    snap: String,
}

#[derive(Args, Debug)]
struct PidsArgs {
    /// Security tag, e.g. snap.pkg.app
    tag: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, None));

    let exit_code = match &cli.command {
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
        command => match load(&cli.global) {
            Ok(resolved) => match command {
                Commands::Check(args) => run_check(&cli.global, &resolved, args),
                Commands::Wait(args) => run_wait(&cli.global, &resolved, args),
                Commands::Pids(args) => run_pids(&cli.global, &resolved, args),
                Commands::Config => run_config(&cli.global, &resolved),
                Commands::Version => ExitCode::Clean,
            },
            Err(err) => output_config_error(&cli.global, &err),
        },
    };

    std::process::exit(exit_code.as_i32());
}

fn load(global: &GlobalOpts) -> Result<ResolvedConfig, ConfigError> {
    let resolved = load_config(global.config.as_deref())?;
    match &resolved.path {
        Some(path) => debug!(
            event = event_names::CONFIG_LOADED,
            path = %path.display(),
            source = %resolved.source,
            "configuration loaded"
        ),
        None => debug!(event = event_names::CONFIG_DEFAULT_USED, "using built-in configuration"),
    }
    Ok(resolved)
}

// ============================================================================
// Commands
// ============================================================================

fn run_check(global: &GlobalOpts, resolved: &ResolvedConfig, args: &CheckArgs) -> ExitCode {
    let info = match SnapInfo::load(&args.snap_info) {
        Ok(info) => info,
        Err(err) => return output_error(global, snap_info_exit_code(&err), &err.to_string()),
    };
    let policy = if args.hard {
        CheckPolicy::Hard
    } else {
        CheckPolicy::Soft
    };

    let paths = &resolved.config.paths;
    let checker = RefreshChecker::new(
        PidsCgroup::new(&paths.pids_cgroup_dir),
        LockDir::new(&paths.lock_dir),
    );

    match checker.check(&info, policy) {
        Ok(()) => {
            match global.format {
                OutputFormat::Json => print_json(&json!({
                    "status": "clear",
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "snap": info.name,
                    "policy": policy,
                })),
                OutputFormat::Human => println!("snap {:?}: nothing running ({policy} check)", info.name),
            }
            ExitCode::Clean
        }
        Err(CheckError::Busy(busy)) => {
            match global.format {
                OutputFormat::Json => print_json(&json!({
                    "status": "busy",
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "policy": policy,
                    "busy": busy,
                })),
                OutputFormat::Human => {
                    println!("{busy}");
                    let pids: Vec<String> = busy.pids().iter().map(|p| p.to_string()).collect();
                    println!("pids: {}", pids.join(" "));
                }
            }
            ExitCode::Busy
        }
        Err(CheckError::Lock(err)) => output_error(global, lock_exit_code(&err), &err.to_string()),
        Err(CheckError::Census(err)) => {
            output_error(global, census_exit_code(&err), &err.to_string())
        }
    }
}

fn run_wait(global: &GlobalOpts, resolved: &ResolvedConfig, args: &WaitArgs) -> ExitCode {
    if let Err(err) = SnapInfo::validate_name(&args.snap) {
        return output_error(global, ExitCode::ArgsError, &err.to_string());
    }

    let wait = &resolved.config.wait;
    let caps = SessionCapabilities::detect(&wait.helper_program);
    debug!(?caps, "session capabilities");
    let mut coordinator = WaitCoordinator::new(
        RunInhibitStore::new(&resolved.config.paths.inhibit_dir),
        ZenityLauncher::new(wait.helper_program.clone()),
        caps,
        MessageStream::for_format(global.format).writer(),
    )
    .with_options(WaitOptions::from(wait));

    match coordinator.wait_while_inhibited(&args.snap) {
        Ok(outcome) => {
            match global.format {
                OutputFormat::Json => print_json(&json!({
                    "status": "clear",
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "snap": args.snap,
                    "result": outcome,
                })),
                OutputFormat::Human => println!("snap {:?} can be used", args.snap),
            }
            ExitCode::Clean
        }
        Err(err) => output_error(global, wait_exit_code(&err), &err.to_string()),
    }
}

/// Where the text wait flow prints its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageStream {
    Stdout,
    Stderr,
}

impl MessageStream {
    /// JSON output keeps stdout for the payload alone.
    fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => MessageStream::Stderr,
            OutputFormat::Human => MessageStream::Stdout,
        }
    }

    fn writer(self) -> Box<dyn std::io::Write> {
        match self {
            MessageStream::Stdout => Box::new(std::io::stdout()),
            MessageStream::Stderr => Box::new(std::io::stderr()),
        }
    }
}

fn run_pids(global: &GlobalOpts, resolved: &ResolvedConfig, args: &PidsArgs) -> ExitCode {
    let Some(tag) = SecurityTag::parse(&args.tag) else {
        return output_error(
            global,
            ExitCode::ArgsError,
            &format!("invalid security tag {:?}", args.tag),
        );
    };

    let census = PidsCgroup::new(&resolved.config.paths.pids_cgroup_dir);
    match census.pids_of(&tag) {
        Ok(pids) => {
            match global.format {
                OutputFormat::Json => print_json(&json!({
                    "tag": tag,
                    "count": pids.len(),
                    "pids": pids,
                })),
                OutputFormat::Human => {
                    for pid in &pids {
                        println!("{pid}");
                    }
                }
            }
            ExitCode::Clean
        }
        Err(err) => output_error(global, census_exit_code(&err), &err.to_string()),
    }
}

fn run_config(global: &GlobalOpts, resolved: &ResolvedConfig) -> ExitCode {
    let path = resolved.path.as_ref().map(|p| p.display().to_string());
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "source": resolved.source,
            "path": path,
            "config": resolved.config,
        })),
        OutputFormat::Human => {
            let config = &resolved.config;
            println!("source: {}", resolved.source);
            println!("path: {}", path.as_deref().unwrap_or("(built-in defaults)"));
            println!("pids_cgroup_dir: {}", config.paths.pids_cgroup_dir.display());
            println!("lock_dir: {}", config.paths.lock_dir.display());
            println!("inhibit_dir: {}", config.paths.inhibit_dir.display());
            println!("poll_interval_ms: {}", config.wait.poll_interval_ms);
            println!("helper_check_interval_ms: {}", config.wait.helper_check_interval_ms);
            println!("helper_program: {}", config.wait.helper_program);
        }
    }
    ExitCode::Clean
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "srg_version": env!("CARGO_PKG_VERSION"),
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
        })),
        OutputFormat::Human => println!("srg {}", env!("CARGO_PKG_VERSION")),
    }
}

// ============================================================================
// Output and error mapping
// ============================================================================

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => error!(error = %err, "cannot render output"),
    }
}

fn output_error(global: &GlobalOpts, code: ExitCode, message: &str) -> ExitCode {
    error!(code = code.code_name(), "{message}");
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "status": "error",
            "error": {
                "code": code.code_name(),
                "exit_code": code.as_i32(),
                "message": message,
            }
        })),
        OutputFormat::Human => eprintln!("error: {message}"),
    }
    code
}

fn output_config_error(global: &GlobalOpts, err: &ConfigError) -> ExitCode {
    let code = match err {
        ConfigError::IoError { source, .. } => from_io_error(source),
        ConfigError::NotFound { .. }
        | ConfigError::ParseError { .. }
        | ConfigError::ValidationError(_) => ExitCode::ConfigError,
    };
    output_error(global, code, &err.to_string())
}

fn snap_info_exit_code(err: &SnapInfoError) -> ExitCode {
    match err {
        SnapInfoError::Io { source, .. } if source.kind() != std::io::ErrorKind::NotFound => {
            from_io_error(source)
        }
        _ => ExitCode::ArgsError,
    }
}

fn lock_exit_code(err: &LockError) -> ExitCode {
    match err {
        LockError::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => {
            ExitCode::PermissionError
        }
        _ => ExitCode::LockError,
    }
}

fn census_exit_code(err: &CensusError) -> ExitCode {
    match err {
        CensusError::Io { source, .. } => from_io_error(source),
        CensusError::Parse { .. } => ExitCode::ParseError,
    }
}

fn wait_exit_code(err: &WaitError) -> ExitCode {
    match err {
        WaitError::Hint(HintError::Io { source, .. }) => from_io_error(source),
        WaitError::HelperSpawn { source, .. } => from_io_error(source),
        WaitError::Helper(source) => from_io_error(source),
    }
}
