//! Lobcast binary
//!
//! Entry point for every Lobcast process. Loads configuration, initializes
//! logging and runs one role: the queue worker, the HTTP service, the live
//! result stream, the depth poller, or one of the operator tools.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lobcast_runner::{RunnerConfig, load_config, load_default_config};

/// Lobcast order-book prediction service
#[derive(Parser, Debug)]
#[command(name = "lobcast", about = "Limit-order-book prediction pipeline")]
struct Args {
    /// Path to JSON configuration file (embedded defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the broker URL from the configuration
    #[arg(long, global = true)]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consume order books from the inbound queue and publish predictions
    Worker {
        /// Also run the depth poller in this process
        #[arg(long)]
        poll: bool,
        /// Names this worker's processing list; keep it stable across restarts
        #[arg(long)]
        worker_id: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        /// Listen address, e.g. 0.0.0.0:8001
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Relay published predictions to WebSocket clients on /ws
    Stream {
        /// Listen address, e.g. 0.0.0.0:9000
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Poll the exchange depth endpoint into the inbound queue
    Poll,
    /// Push an order-book JSON file onto the inbound queue
    Push {
        file: PathBuf,
        /// Also take the next result off the results queue, waiting up to
        /// this many seconds; it may belong to another producer
        #[arg(short, long)]
        wait: Option<u64>,
    },
    /// Run the local pipeline over a CSV file and print the response
    Predict { file: PathBuf },
    /// Print the effective configuration
    Config,
}

fn load(args: &Args) -> anyhow::Result<RunnerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    if let Some(url) = &args.redis_url {
        config.broker.url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load(&args)?;

    log::info!(
        "Starting lobcast ({:?}, broker {:?}, {} models)",
        args.command,
        config.broker.kind,
        config.models.len()
    );

    match args.command {
        Command::Worker { poll, worker_id } => commands::worker(config, poll, worker_id).await,
        Command::Serve { bind } => commands::serve(config, bind).await,
        Command::Stream { bind } => commands::stream(config, bind).await,
        Command::Poll => commands::poll(config).await,
        Command::Push { file, wait } => commands::push(config, &file, wait).await,
        Command::Predict { file } => commands::predict(config, &file).await,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
