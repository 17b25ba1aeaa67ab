use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use mapsync::{server, Config, Database};

#[derive(Parser)]
#[command(name = "mapsync")]
#[command(
    about = "Real-time shared map state server with versioned writes and WebSocket fan-out",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and seed the state database
    Init {
        #[arg(long, default_value = "mapsync.db")]
        db: PathBuf,
    },

    /// Run the sync server
    Serve {
        /// Listen port (overrides BIND_ADDR)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path (overrides DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Static assets directory (overrides STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print the current map state document
    State {
        #[arg(long, default_value = "mapsync.db")]
        db: PathBuf,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        db: None,
        static_dir: None,
    });

    match command {
        Commands::Init { db } => {
            println!("{}", "Initializing map state database...".cyan().bold());
            let database = Database::new(&db)?;
            database.initialize()?;
            println!(
                "{} Database ready at {}",
                "✓".green(),
                db.display().to_string().bright_white()
            );
        }

        Commands::Serve {
            port,
            db,
            static_dir,
        } => {
            let mut config = Config::from_env();
            if let Some(port) = port {
                config.bind_addr = format!("0.0.0.0:{port}");
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(dir) = static_dir {
                config.static_dir = dir;
            }

            println!(
                "{}",
                format!("Starting map sync server on {}...", config.bind_addr)
                    .cyan()
                    .bold()
            );
            server::start(config).await?;
        }

        Commands::State { db } => {
            let database = Database::new(&db)?;
            database.initialize()?;
            let doc = database.get_state()?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}
