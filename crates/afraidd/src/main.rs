// # afraidd - afraid.org update daemon
//
// Thin integration layer over afraid-core:
// 1. Parsing the command line into an AgentConfig
// 2. Initializing logging and the runtime
// 3. Loading the account's records (fatal on failure)
// 4. Running the update scheduler until SIGINT/SIGTERM, or relaunching
//    itself in the background to do so
//
// ## Example
//
// ```bash
// afraidd --interval 3600 --log /var/log/afraid.log me@example.com s3cr3t home.example.com
// ```

mod cli;

use afraid_core::{AgentConfig, HttpClient, UpdateScheduler, load_records};
use afraid_http::ReqwestHttpClient;
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, background_args};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, ExitCode, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Bad configuration, or the account listing could not be loaded
    StartupError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                DaemonExitCode::StartupError.into()
            } else {
                DaemonExitCode::CleanShutdown.into()
            };
        }
    };

    let config = cli.to_config();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::StartupError.into();
    }

    // In the background case the child sets up its own logging
    if !cli.daemonize {
        if let Err(e) = init_tracing(&cli.log_level, cli.log.as_deref()) {
            eprintln!("{:#}", e);
            return DaemonExitCode::StartupError.into();
        }
        info!("Starting afraidd");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let report_on_stderr = cli.daemonize || cli.log.is_some();
    rt.block_on(async {
        let launch = match build_http_client() {
            Ok(http) => start(http, &config, cli.daemonize, relaunch_in_background).await,
            Err(e) => Err(e),
        };

        let mut scheduler = match launch {
            Ok(Launch::Foreground(scheduler)) => scheduler,
            Ok(Launch::Background(pid)) => {
                if cli.log.is_none() {
                    eprintln!("No --log file given; background output is discarded");
                }
                println!("afraidd running in background (pid {})", pid);
                return DaemonExitCode::CleanShutdown;
            }
            Err(e) => {
                error!("Startup failed: {:#}", e);
                if report_on_stderr {
                    eprintln!("Startup failed: {:#}", e);
                }
                return DaemonExitCode::StartupError;
            }
        };

        match scheduler.run().await {
            Ok(()) => {
                info!("Shutting down daemon");
                DaemonExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Daemon error: {}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Outcome of a successful startup phase
enum Launch {
    /// Run the scheduler in this process
    Foreground(UpdateScheduler),
    /// A background copy was started with this PID
    Background(u32),
}

fn build_http_client() -> Result<Arc<dyn HttpClient>> {
    let http = ReqwestHttpClient::new().context("Failed to initialise HTTP client")?;
    Ok(Arc::new(http))
}

/// Startup phase: load the records and build the scheduler, then decide
/// where the loop runs
///
/// `relaunch` is only invoked once startup has succeeded, so a bad login or
/// an unreachable API is reported by the invoking process in both modes.
async fn start<F>(
    http: Arc<dyn HttpClient>,
    config: &AgentConfig,
    daemonize: bool,
    relaunch: F,
) -> Result<Launch>
where
    F: FnOnce() -> Result<u32>,
{
    let records = load_records(&*http, config)
        .await
        .context("Failed to retrieve the account's records")?;

    let (scheduler, _events) = UpdateScheduler::new(http, records, config)
        .context("Failed to start the update scheduler")?;

    if daemonize {
        return Ok(Launch::Background(relaunch()?));
    }

    Ok(Launch::Foreground(scheduler))
}

/// Install the global subscriber, writing to stdout or appending to `log_file`
fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let log_level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(log_level);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = builder.with_ansi(false).with_writer(Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set tracing subscriber")?;
        }
        None => {
            tracing::subscriber::set_global_default(builder.finish())
                .context("Failed to set tracing subscriber")?;
        }
    }

    Ok(())
}

/// Start a detached copy of this process without the daemonize flag
///
/// Returns the child's PID.
fn relaunch_in_background() -> Result<u32> {
    let exe = std::env::current_exe().context("Failed to locate the afraidd executable")?;

    let mut command = Command::new(exe);
    command
        .args(background_args(std::env::args_os().skip(1)))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // Own process group, so terminal signals aimed at the parent miss the child
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command
        .spawn()
        .context("Failed to start background process")?;

    Ok(child.id())
}
