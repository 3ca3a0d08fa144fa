//! nad-proxy: HTTP API bridge for NAD amplifier serial control.
//!
//! Speaks the amplifier's line-oriented RS-232 protocol on one side and a
//! small JSON-over-HTTP API on the other.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

use nad_proxy::{logging, web, AmpClient};
use nad_proxy::web::WebState;

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// nad-proxy - HTTP API bridge for NAD amplifier serial control
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the serial device
    #[arg(short, long)]
    device: Option<String>,

    /// Allow volume adjustment. Use with caution!
    #[arg(short = 'x', long)]
    volume: bool,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Directory where log files are stored
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Number of days to keep log files
    #[arg(long, default_value = "7")]
    log_retention_days: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start the API server
    Serve {
        /// Listen address
        #[arg(short, long, default_value = DEFAULT_LISTEN)]
        listen: SocketAddr,

        /// Directory to serve static assets from
        #[arg(short, long)]
        static_dir: Option<PathBuf>,
    },
    /// Send a single command to the amplifier
    Cli {
        /// Command to send
        #[arg(short, long)]
        command: String,
    },
}

/// Configuration file format.
#[derive(Debug, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, serde::Deserialize, Default)]
struct ServerSection {
    listen: Option<String>,
    device: Option<String>,
    static_dir: Option<String>,
    enable_volume: Option<bool>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct LoggingSection {
    log_dir: Option<String>,
    retention_days: Option<u64>,
    level: Option<String>,
}

fn load_config(path: &PathBuf) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load config file: explicit path > auto-detect > default
    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from("nad-proxy.toml");
        if default_path.exists() {
            Some(default_path)
        } else {
            None
        }
    });
    let file_config = if let Some(config_path) = &config_path {
        match load_config(config_path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", config_path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {e}");
                return Err(e);
            }
        }
    } else {
        ConfigFile::default()
    };

    // Merge logging configs (command line takes precedence)
    let log_dir = if args.log_dir.to_string_lossy() != "logs" {
        args.log_dir.clone()
    } else {
        PathBuf::from(file_config.logging.log_dir.as_deref().unwrap_or("logs"))
    };
    let log_retention_days = if args.log_retention_days != 7 {
        args.log_retention_days
    } else {
        file_config.logging.retention_days.unwrap_or(7)
    };

    logging::init_logging(
        &log_dir,
        log_retention_days,
        args.verbose,
        file_config.logging.level.as_deref(),
    )
    .expect("Failed to initialize logging");

    let device = args
        .device
        .or(file_config.server.device)
        .ok_or("No serial device configured (use --device or [server].device)")?;
    let enable_volume = args.volume || file_config.server.enable_volume.unwrap_or(false);

    info!("Opening serial device: {}", device);
    let client = Arc::new(AmpClient::open(&device, enable_volume)?);
    if enable_volume {
        info!("Volume adjustment is enabled");
    }

    match args.command {
        Cmd::Serve { listen, static_dir } => {
            // Config file fills in anything left at the flag defaults.
            let listen = if listen.to_string() != DEFAULT_LISTEN {
                listen
            } else {
                match &file_config.server.listen {
                    Some(addr) => addr.parse::<SocketAddr>()?,
                    None => listen,
                }
            };
            let static_dir =
                static_dir.or_else(|| file_config.server.static_dir.as_deref().map(PathBuf::from));

            info!("nad-proxy starting...");
            info!("  Listen address: {}", listen);
            info!("  Serial device: {}", device);
            if let Some(dir) = &static_dir {
                info!("  Static assets: {}", dir.display());
            }

            web::start_web_server(listen, WebState::new(client), static_dir).await?;
        }
        Cmd::Cli { command } => {
            let reply = tokio::task::spawn_blocking(move || client.send_raw(&command)).await??;
            println!("{}", String::from_utf8_lossy(&reply));
        }
    }

    Ok(())
}
