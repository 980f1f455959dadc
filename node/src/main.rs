//! ITEMLEDGER Node Binary

use clap::{Parser, Subcommand};
use itemledger_core::NodeConfig;
use itemledger_items::SeedConfig;
use itemledger_node::NodeBuilder;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "itemledger-node")]
#[command(about = "ITEMLEDGER Node - Item records over a transactional ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed file path
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep the world state in a sled database under the data directory
        #[arg(long)]
        persistent: bool,

        /// Do not seed an empty ledger on start
        #[arg(long)]
        no_seed: bool,
    },

    /// Write the default seed file
    Seed {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default configuration file
    Config {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            api_addr,
            data_dir,
            persistent,
            no_seed,
        } => {
            let config = match config {
                Some(path) => NodeConfig::from_file(&path)?,
                None => NodeConfig::default(),
            };

            init_logging(&config.log_level);
            info!("Starting ITEMLEDGER Node...");

            let seed_config = match seed {
                Some(path) => {
                    info!("Loading seed from {}", path.display());
                    SeedConfig::from_file(&path)?
                }
                None => SeedConfig::default(),
            };

            // Build node
            let mut builder = NodeBuilder::new().config(config).seed(seed_config);

            if let Some(addr) = api_addr {
                builder = builder.api_addr(&addr);
            }
            if let Some(dir) = data_dir {
                builder = builder.data_dir(dir);
            }
            if persistent {
                builder = builder.persistent();
            }
            if no_seed {
                builder = builder.skip_seed();
            }

            let node = builder.build()?;

            // Start node
            node.start().await?;
        }

        Commands::Seed { output } => {
            let json = SeedConfig::default().to_json()?;
            std::fs::write(&output, &json)?;

            println!("Seed configuration saved to: {}", output.display());
        }

        Commands::Config { output } => {
            let json = NodeConfig::default().to_json()?;
            std::fs::write(&output, &json)?;

            println!("Node configuration saved to: {}", output.display());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
