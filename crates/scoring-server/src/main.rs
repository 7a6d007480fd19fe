//! Scoring server - entry point.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};

use scoring_config::{ConfigError, ConfigLoader, ScoringConfig};
use scoring_server::{setup, Server, ShutdownSignal, VERSION};
use scoring_telemetry::{init_logging, init_metrics};

/// Prefix of `SCORING__SECTION__KEY` overrides.
const ENV_PREFIX: &str = "SCORING";

/// Command-line arguments.
struct Args {
    /// Overrides the port of `server.http_addr`.
    port: Option<u16>,
    /// Log file, overrides `logging.file`.
    log: Option<PathBuf>,
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            port: None,
            log: None,
            config: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => {
                    let value = args.next().unwrap_or_default();
                    match value.parse() {
                        Ok(port) => parsed.port = Some(port),
                        Err(_) => usage_error(&format!("invalid port: '{value}'")),
                    }
                }
                "--log" | "-l" => {
                    parsed.log = args.next().map(PathBuf::from);
                }
                "--config" | "-c" => {
                    parsed.config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("scoring-server {VERSION}");
                    std::process::exit(0);
                }
                other => usage_error(&format!("unknown argument: {other}")),
            }
        }

        parsed
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    eprintln!("Use --help for usage information");
    std::process::exit(1);
}

fn print_help() {
    println!(
        r"Scoring server - validating scoring API over HTTP

USAGE:
    scoring-server [OPTIONS]

OPTIONS:
    -p, --port <PORT>      Listen port (overrides server.http_addr)
    -l, --log <PATH>       Append logs to this file instead of stdout
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    SCORING__SECTION__KEY  Override any configuration key,
                           e.g. SCORING__STORE__BACKEND=memory
    REDIS_DSN              Redis connection string (overrides store.dsn)
    RUST_LOG               Log filter (overrides logging.level)

ENDPOINTS:
    POST /method           Method call
    GET  /health           Liveness check
"
    );
}

fn load_config(args: &Args) -> Result<ScoringConfig, ConfigError> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }

    let mut config = loader.with_env_prefix(ENV_PREFIX).load()?;
    if let Some(port) = args.port {
        config.set_port(port)?;
    }
    if let Some(log) = &args.log {
        config.logging.file = Some(log.display().to_string());
    }
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args).context("failed to load configuration")?;

    init_logging(&setup::log_config(&config.logging)).context("failed to initialize logging")?;
    init_metrics(&setup::metrics_config(&config.metrics))
        .context("failed to initialize metrics")?;

    info!(version = VERSION, "starting scoring server");

    let store = setup::build_store(&config.store)?;
    let dispatcher = setup::build_dispatcher(&config, store);
    let server = Server::bind(&config.server, dispatcher).await?;

    server.serve(ShutdownSignal::with_os_signals()).await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        error!(error = %format!("{err:#}"), "scoring server failed");
        eprintln!("scoring-server: {err:#}");
        std::process::exit(1);
    }
}
