use std::fs;

use anyhow::Result;
use assessment::cloning::StructureCloner;
use assessment::database::{establish_connection, get_database_url, migrations::Migrator};
use assessment::server;
use assessment::services::StructureSpreadsheetService;
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[cfg(feature = "server")]
    Serve {
        #[clap(short, long, default_value = "3000")]
        port: u16,
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
        #[clap(long)]
        cors_origin: Option<String>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Copy the structure of one container into another
    Clone {
        #[clap(short, long)]
        source: i32,
        #[clap(short = 't', long)]
        destination: i32,
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
    },
    /// Write a container's structure to an xlsx file
    Export {
        #[clap(short, long)]
        container: i32,
        #[clap(short, long)]
        output: String,
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
    },
    /// Load an xlsx structure sheet into a container
    Import {
        #[clap(short, long)]
        container: i32,
        #[clap(short, long)]
        input: String,
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long, default_value = "assessment.db")]
        database: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            port,
            database,
            cors_origin,
        } => {
            info!("Starting server on port {}", port);
            server::start_server(port, &database, cors_origin.as_deref()).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initializing database: {}", database);
                server::migrate_database(&database, server::MigrateDirection::Up).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                info!("Running database migration: {:?}", direction);
                server::migrate_database(&database, direction).await?;
            }
        },
        Commands::Clone {
            source,
            destination,
            database,
        } => {
            let db = open_database(&database).await?;
            let summary = StructureCloner::new(db)
                .clone_structure(source, destination)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Export {
            container,
            output,
            database,
        } => {
            let db = open_database(&database).await?;
            let bytes = StructureSpreadsheetService::new(db)
                .export_to_xlsx(container)
                .await?;
            fs::write(&output, bytes)?;
            info!("Wrote structure of container {} to {}", container, output);
        }
        Commands::Import {
            container,
            input,
            database,
        } => {
            let db = open_database(&database).await?;
            let data = fs::read(&input)?;
            let result = StructureSpreadsheetService::new(db)
                .import_from_xlsx(container, &data)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn open_database(database_path: &str) -> Result<DatabaseConnection> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{}", log_level)))
        .without_time()
        .init();
}
