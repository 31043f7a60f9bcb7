use std::time::Duration;

use clap::Parser;

/// Drives zero-value self-transfer transactions against an
/// Ethereum-compatible JSON-RPC endpoint at a fixed interval, exporting
/// Prometheus metrics either on a local scrape endpoint or to a push
/// gateway.
#[derive(Debug, Parser)]
#[command(name = "txn-driver")]
pub struct Cli {
    /// JSON-RPC endpoint URL, e.g. http://localhost:8545
    pub endpoint: String,

    /// Milliseconds between transaction attempts (at least 1)
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Push-gateway base URL. Enables push mode: metrics are shipped after
    /// every tick and no local scrape endpoint is started.
    #[arg(requires = "push_job_prefix")]
    pub push_gateway: Option<String>,

    /// Prefix for the push job name; the full job is `<prefix>-web3-txn`
    #[arg(requires = "push_instance")]
    pub push_job_prefix: Option<String>,

    /// Value of the `instance` grouping label attached to each push
    #[arg(requires = "push_gateway")]
    pub push_instance: Option<String>,
}

/// Fully resolved push-mode configuration. The three arguments are
/// all-or-nothing; `Cli::push_target` yields `Some` only when every one of
/// them was supplied.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub gateway: String,
    pub job: String,
    pub instance: String,
}

/// Parses the command line, exiting on failure with the status
/// `exit_code` assigns to the error.
pub fn parse_or_exit() -> Cli {
    Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        std::process::exit(exit_code(&err));
    })
}

/// Exit status for an argument-parsing failure. A wrong argument count
/// (too few, too many, or a partial push triple) gets status 0 like the
/// original client; a malformed value such as a zero interval keeps
/// clap's conventional status 2.
pub fn exit_code(err: &clap::Error) -> i32 {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::MissingRequiredArgument
        | ErrorKind::UnknownArgument
        | ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion => 0,
        _ => 2,
    }
}

impl Cli {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn push_target(&self) -> Option<PushTarget> {
        match (&self.push_gateway, &self.push_job_prefix, &self.push_instance) {
            (Some(gateway), Some(prefix), Some(instance)) => Some(PushTarget {
                gateway: gateway.clone(),
                job: format!("{prefix}-web3-txn"),
                instance: instance.clone(),
            }),
            _ => None,
        }
    }
}
