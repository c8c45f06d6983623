//! Command-line surface
//!
//! ```text
//! afraidd [-d] [--log FILE] [--interval SECONDS] LOGIN PASSWORD [HOSTS...]
//! ```

use afraid_core::AgentConfig;
use afraid_core::listing::DEFAULT_API_URL;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "afraidd", version)]
#[command(about = "freedns.afraid.org dynamic DNS update agent")]
pub struct Cli {
    /// Account login
    pub login: String,

    /// Account password
    pub password: String,

    /// Hostnames to update (default: all hosts on the account)
    pub hosts: Vec<String>,

    /// Run in the background
    #[arg(short = 'd', long)]
    pub daemonize: bool,

    /// Append log output to this file instead of stdout
    #[arg(long, value_name = "FILE", env = "AFRAID_LOG")]
    pub log: Option<PathBuf>,

    /// Seconds between update passes
    #[arg(long, value_name = "SECONDS", default_value_t = 21600, env = "AFRAID_INTERVAL")]
    pub interval: u64,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 2, env = "AFRAID_TIMEOUT")]
    pub timeout: u64,

    /// Account listing endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL, env = "AFRAID_API_URL")]
    pub api_url: String,

    /// Log verbosity
    #[arg(
        long,
        default_value = "info",
        env = "AFRAID_LOG_LEVEL",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl Cli {
    pub fn to_config(&self) -> AgentConfig {
        AgentConfig::new(&self.login, &self.password)
            .with_hosts(self.hosts.clone())
            .with_interval(self.interval)
            .with_request_timeout(self.timeout)
            .with_api_url(&self.api_url)
    }
}

/// Arguments for the background copy of this process: the same, minus the
/// daemonize flag. Anything after `--` is passed through untouched.
pub fn background_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .filter(|arg| {
            if passthrough {
                return true;
            }
            if arg == "--" {
                passthrough = true;
                return true;
            }
            arg != "-d" && arg != "--daemonize"
        })
        .collect()
}
