//! ITEMLEDGER CLI - Command Line Interface

use clap::{Parser, Subcommand};
use colored::Colorize;
use itemledger_cli::{format_items, ApiClient, ItemInfo};

#[derive(Parser)]
#[command(name = "itemctl")]
#[command(about = "itemctl - ITEMLEDGER item records CLI")]
#[command(version)]
struct Cli {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the ledger with the bootstrap items
    Init,

    /// Create an item (overwrites an existing id)
    Create {
        id: String,
        name: String,
        #[arg(allow_hyphen_values = true)]
        price: i64,
    },

    /// Show an item
    Read { id: String },

    /// Change an item's name and price
    Update {
        id: String,
        name: String,
        #[arg(allow_hyphen_values = true)]
        price: i64,
    },

    /// Delete an item
    Delete { id: String },

    /// Check whether an item exists
    Exists { id: String },

    /// List all items
    List,

    /// Call a contract function by name
    Invoke {
        function: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Node status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api_client = ApiClient::new(&cli.node)?;

    if let Err(e) = run(cli.command, &api_client).await {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, api_client: &ApiClient) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            api_client.init_ledger().await?;
            println!("{} Ledger seeded", "✓".green());
        }

        Commands::Create { id, name, price } => {
            let item = ItemInfo { id, name, price };
            api_client.create_item(&item).await?;
            println!("{} Item '{}' created", "✓".green(), item.id);
        }

        Commands::Read { id } => {
            let item = api_client.read_item(&id).await?;
            println!("ID:    {}", item.id);
            println!("Name:  {}", item.name);
            println!("Price: {}", item.price);
        }

        Commands::Update { id, name, price } => {
            api_client.update_item(&id, &name, price).await?;
            println!("{} Item '{}' updated", "✓".green(), id);
        }

        Commands::Delete { id } => {
            api_client.delete_item(&id).await?;
            println!("{} Item '{}' deleted", "✓".green(), id);
        }

        Commands::Exists { id } => {
            let exists = api_client.item_exists(&id).await?;
            println!("{}", exists);
        }

        Commands::List => {
            let items = api_client.list_items().await?;
            print!("{}", format_items(&items));
            if items.is_empty() {
                println!();
            }
        }

        Commands::Invoke { function, args } => {
            match api_client.invoke(&function, args).await? {
                Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
                None => println!("{} {} committed", "✓".green(), function),
            }
        }

        Commands::Status => {
            let status = api_client.status().await?;
            println!("ITEMLEDGER Node Status");
            println!("======================");
            println!("Name:          {}", status.name);
            println!("Storage:       {}", status.storage);
            println!("State Version: {}", status.state_version);
            println!("Records:       {}", status.record_count);
            println!("Committed Txs: {}", status.committed_transactions);
        }
    }

    Ok(())
}
