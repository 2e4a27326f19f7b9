//! Meridian Gateway - Entry point

use meridian_gateway::cli::{self, HELP};
use meridian_gateway::{Cli, Command, GatewayResult, VERSION};
use meridian_telemetry::init_telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = match Cli::parse_from(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Use --help for usage information");
            std::process::exit(2);
        }
    };

    match cli.command {
        Command::Help => {
            print!("{HELP}");
            return;
        }
        Command::Version => {
            println!("meridian-gateway {VERSION}");
            return;
        }
        _ => {}
    }

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&config.telemetry.to_telemetry_config()) {
        eprintln!("Failed to initialize telemetry: {e}");
        std::process::exit(1);
    }

    info!(version = VERSION, command = ?cli.command, "Starting Meridian gateway");

    if let Err(e) = execute(&cli, config).await {
        error!(error = %e, category = e.category(), "Gateway command failed");
        std::process::exit(1);
    }
}

async fn execute(cli: &Cli, config: meridian_config::MeridianConfig) -> GatewayResult<()> {
    let output = cli.output.as_deref();
    match cli.command {
        Command::Discover => cli::write_json(&cli::discover(config).await?, output),
        Command::Merge => cli::write_json(&cli::merge(config).await?, output),
        _ => cli::run(config).await,
    }
}
