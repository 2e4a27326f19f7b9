//! Command-line parsing and the sub-command runners.

use std::fs;
use std::path::{Path, PathBuf};

use meridian_config::{ConfigLoader, MeridianConfig, DEFAULT_ENV_PREFIX};
use meridian_core::{ApiDocument, Route, Service, ShutdownSignal};
use meridian_discovery::DiscoveryError;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;

/// Configuration file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_FILE: &str = "meridian.toml";

/// Sub-command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Register, run periodic discovery and wait for Ctrl-C.
    Run,
    /// Run one discovery pass and print the route table.
    Discover,
    /// Build the merged API document.
    Merge,
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    /// Sub-command.
    pub command: Command,
    /// Configuration file.
    pub config: Option<PathBuf>,
    /// Output file for `discover` and `merge`; stdout when unset.
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Parses arguments, program name excluded. The sub-command defaults to
    /// `run`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Usage`] for unknown arguments or a flag
    /// missing its value.
    pub fn parse_from<I>(args: I) -> GatewayResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut command = None;
        let mut config = None;
        let mut output = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => config = Some(flag_value(&mut args, &arg)?),
                "--output" | "-o" => output = Some(flag_value(&mut args, &arg)?),
                "--help" | "-h" => return Ok(Self::only(Command::Help)),
                "--version" | "-v" => return Ok(Self::only(Command::Version)),
                "run" | "discover" | "merge" if command.is_none() => {
                    command = Some(match arg.as_str() {
                        "run" => Command::Run,
                        "discover" => Command::Discover,
                        _ => Command::Merge,
                    });
                }
                other => {
                    return Err(GatewayError::usage(format!("unknown argument: {other}")));
                }
            }
        }

        let command = command.unwrap_or(Command::Run);
        if command == Command::Run && output.is_some() {
            return Err(GatewayError::usage("--output is not supported by 'run'"));
        }

        Ok(Self {
            command,
            config,
            output,
        })
    }

    fn only(command: Command) -> Self {
        Self {
            command,
            config: None,
            output: None,
        }
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> GatewayResult<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .ok_or_else(|| GatewayError::usage(format!("{flag} requires a value")))
}

/// Usage text.
pub const HELP: &str = r"Meridian Gateway - route discovery and API document merging

USAGE:
    meridian-gateway [COMMAND] [OPTIONS]

COMMANDS:
    run         Register, keep the route table fresh, wait for Ctrl-C (default)
    discover    Run one discovery pass and print the route table as JSON
    merge       Print the merged API document of every registered service

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON, default: meridian.toml if present)
    -o, --output <PATH>    Write discover/merge output to a file instead of stdout
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    MERIDIAN__GATEWAY__HOST                 Host other services reach the gateway on
    MERIDIAN__GATEWAY__HTTP_PORT            Gateway HTTP port (default: 4000)
    MERIDIAN__DISCOVERY__INTERVAL_SECS      Seconds between discovery passes (default: 30)
    MERIDIAN__DISCOVERY__SERVICES           JSON array of services to register at start-up
    MERIDIAN__MERGE__URLS                   Comma-separated extra API document URLs
    MERIDIAN__TELEMETRY__LOGGING__LEVEL     Log filter (default: info)
    MERIDIAN__TELEMETRY__METRICS__ENABLED   Serve Prometheus metrics (default: false)
";

/// Loads configuration: defaults, then `path` (or [`DEFAULT_CONFIG_FILE`] if
/// it exists), then `.env` and `MERIDIAN__*` overrides.
///
/// # Errors
///
/// Returns the loader's error.
pub fn load_config(path: Option<&Path>) -> GatewayResult<MeridianConfig> {
    let loader = ConfigLoader::new().with_defaults().with_dotenv()?;
    let loader = match path {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    Ok(loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?)
}

/// Runs the gateway until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns the first start-up error, or the shutdown error.
pub async fn run(config: MeridianConfig) -> GatewayResult<()> {
    let shutdown = ShutdownSignal::with_os_signals();
    let gateway = Gateway::in_memory(config)?.with_shutdown_signal(shutdown.clone());

    gateway.register().await?;
    gateway.start().await?;
    info!("Gateway running, press Ctrl-C to stop");

    shutdown.recv().await;
    gateway.shutdown().await?;
    info!("Gateway stopped");
    Ok(())
}

/// Seeds the configured services, runs one discovery pass and returns the
/// route table.
///
/// When some services fail under the `continue` policy the failures are
/// logged and the routes of the other services are still returned.
///
/// # Errors
///
/// Returns registry errors and, under the `abort` policy, the first
/// discovery error.
pub async fn discover(config: MeridianConfig) -> GatewayResult<Vec<Route>> {
    let gateway = Gateway::in_memory(config)?;
    gateway.connect().await?;
    gateway.seed_services().await?;

    match gateway.discover_once().await {
        Ok(report) => info!(
            services = report.services.len(),
            routes = report.total_routes(),
            "Discovery finished"
        ),
        Err(GatewayError::Discovery(e @ DiscoveryError::Batch { .. })) => {
            warn!(error = %e, "Discovery finished with failures");
        }
        Err(e) => return Err(e),
    }

    gateway.routes().await
}

/// Seeds the configured services and builds the merged API document.
///
/// # Errors
///
/// Returns the registry or merge error.
pub async fn merge(config: MeridianConfig) -> GatewayResult<ApiDocument> {
    let gateway = Gateway::in_memory(config)?;
    gateway.connect().await?;
    gateway.seed_services().await?;
    gateway.merged_spec().await
}

/// Writes `value` as pretty JSON to `output`, or to stdout.
///
/// # Errors
///
/// Returns serialization or I/O errors.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> GatewayResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")?;
            info!(path = %path.display(), "Output written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GatewayResult<Cli> {
        Cli::parse_from(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.command, Command::Run);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_subcommand_with_options() {
        let cli = parse(&["merge", "-c", "gw.toml", "--output", "public.json"]).unwrap();
        assert_eq!(cli.command, Command::Merge);
        assert_eq!(cli.config, Some(PathBuf::from("gw.toml")));
        assert_eq!(cli.output, Some(PathBuf::from("public.json")));

        let cli = parse(&["--config", "gw.json", "discover"]).unwrap();
        assert_eq!(cli.command, Command::Discover);
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        assert_eq!(parse(&["merge", "-h", "bogus"]).unwrap().command, Command::Help);
        assert_eq!(parse(&["--version"]).unwrap().command, Command::Version);
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(parse(&["serve"]), Err(GatewayError::Usage { .. })));
        assert!(matches!(parse(&["--config"]), Err(GatewayError::Usage { .. })));
        assert!(matches!(
            parse(&["discover", "merge"]),
            Err(GatewayError::Usage { .. })
        ));
        assert!(matches!(
            parse(&["run", "-o", "out.json"]),
            Err(GatewayError::Usage { .. })
        ));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/meridian.toml"))).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        write_json(&serde_json::json!({ "ok": true }), Some(&path)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);
    }
}
