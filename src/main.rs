//! Binary entrypoint for the boardd CLI.
//!
//! Commands:
//! - `start [--host <addr>] [--port <n>]` - run the board server until Ctrl-C
//! - `init` - create a starter `config.toml`
//! - `status` - print the effective configuration and counters
//!
//! See the library crate docs for module-level details: `boardd::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use boardd::bbs::BbsServer;
use boardd::config::Config;

#[derive(Parser)]
#[command(name = "boardd")]
#[command(about = "A line-protocol bulletin board server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the board server
    Start {
        /// Listen host, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a default configuration file
    Init,
    /// Show configuration and counters
    Status,
}

/// Load the config file, falling back to defaults when it cannot be read.
async fn load_or_default(path: &str) -> Config {
    match Config::load(path).await {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{} (using built-in defaults)", e);
            Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init has no config yet; everything else configures logging from the file when present
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = match pre_config {
                Some(cfg) => cfg,
                None => load_or_default(&cli.config).await,
            };
            if let Some(host) = host {
                config.network.host = host;
            }
            if let Some(port) = port {
                config.network.port = port;
            }
            info!("Starting boardd v{}", env!("CARGO_PKG_VERSION"));
            let mut server = BbsServer::new(config).await?;
            server.bind().await?;
            server.run().await?;
        }
        Commands::Init => {
            info!("Initializing new board configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(cfg) => cfg,
                None => load_or_default(&cli.config).await,
            };
            let server = BbsServer::new(config).await?;
            server.show_status().await?;
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            // Echo to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
