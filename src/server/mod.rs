#[cfg(feature = "server")]
pub mod app;
#[cfg(feature = "server")]
pub mod handlers;
#[cfg(feature = "server")]
pub mod responses;

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use crate::database::{connection::*, migrations::Migrator};
use anyhow::Result;
use sea_orm_migration::prelude::*;
use tracing::info;

#[cfg(feature = "server")]
pub async fn start_server(port: u16, database_path: &str, cors_origin: Option<&str>) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let app = app::create_app(db, cors_origin).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "server")]
fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                                  - Health check");
    info!("  /api/v1/containers                       - Templates and assessments");
    info!("  /api/v1/containers/:id/duplicate         - Copy a container with its structure");
    info!("  /api/v1/containers/:id/assessments       - Instantiate an assessment from a template");
    info!("  /api/v1/containers/:id/{{level}}           - categories, topics, factors, contents");
    info!("  /api/v1/containers/:id/export|import     - Structure spreadsheet");
    info!("  /api/v1/clone                            - Clone one structure into another container");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations");
            Migrator::fresh(&db).await?;
        }
    }

    info!("Migration completed successfully");
    Ok(())
}
