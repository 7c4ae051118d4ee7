use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use wt_index_sync::sync::{DeleteOptions, Record, UpdateOptions};
use wt_index_sync::{setup_synchronizer, Config, LocalSynchronizer, SyncError};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file. Without it a local development setup is used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a new hotel from a JSON record.
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Publish the fields present in a JSON record.
    Update {
        #[arg(long)]
        address: String,
        #[arg(long)]
        file: PathBuf,
        /// Re-upload the data index even when nothing changed.
        #[arg(long)]
        force_sync: bool,
    },
    /// Remove a hotel from the index.
    Delete {
        #[arg(long)]
        address: String,
        /// Also remove its off-chain documents.
        #[arg(long)]
        off_chain: bool,
    },
    /// Print a hotel's documents.
    Get {
        #[arg(long)]
        address: String,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Hand a hotel over to another manager.
    Transfer {
        #[arg(long)]
        address: String,
        #[arg(long)]
        manager: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env().context("building default configuration")?,
    };
    log::debug!("[MAIN] command: {:?}", args.command);

    let sync = setup_synchronizer(&config).context("setting up synchronizer")?;

    match run(&sync, args.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            log::error!("[MAIN] {e}");
            eprintln!("{}", serde_json::to_string_pretty(&e.to_body())?);
            std::process::exit(1);
        }
    }
}

async fn run(sync: &LocalSynchronizer, command: Command) -> Result<Value, SyncError> {
    match command {
        Command::Create { file } => {
            let address = sync.create_hotel(read_record(&file)?).await?;
            Ok(json!({ "address": address }))
        }
        Command::Update {
            address,
            file,
            force_sync,
        } => {
            let outcome = sync
                .update_hotel(&address, read_record(&file)?, UpdateOptions { force_sync })
                .await?;
            Ok(serde_json::to_value(outcome)?)
        }
        Command::Delete { address, off_chain } => {
            sync.delete_hotel(
                &address,
                DeleteOptions {
                    purge_off_chain: off_chain,
                },
            )
            .await?;
            Ok(json!({ "address": address, "deleted": true }))
        }
        Command::Get { address, fields } => {
            let hotel = sync.get_hotel(&address, &fields).await?;
            Ok(Value::Object(hotel))
        }
        Command::Transfer { address, manager } => {
            sync.transfer_hotel(&address, &manager).await?;
            Ok(json!({ "address": address, "manager": manager }))
        }
    }
}

fn read_record(path: &Path) -> Result<Record, SyncError> {
    let raw = std::fs::read(path)?;
    match serde_json::from_slice(&raw)? {
        Value::Object(record) => Ok(record),
        _ => Err(SyncError::BadRequest(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}
