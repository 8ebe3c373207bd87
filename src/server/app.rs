use anyhow::{anyhow, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{categories, clone, containers, contents, factors, health, spreadsheet, topics};

/// Upper bound for spreadsheet uploads
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState { db };

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/containers",
            get(containers::list_containers).post(containers::create_container),
        )
        .route(
            "/api/v1/containers/:id",
            get(containers::get_container)
                .put(containers::update_container)
                .delete(containers::delete_container),
        )
        .route(
            "/api/v1/containers/:id/duplicate",
            post(containers::duplicate_container),
        )
        .route(
            "/api/v1/containers/:id/assessments",
            post(containers::create_assessment_from_template),
        )
        .route("/api/v1/clone", post(clone::clone_structure))
        .route(
            "/api/v1/containers/:id/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/containers/:id/categories/reorder",
            post(categories::reorder_categories),
        )
        .route(
            "/api/v1/containers/:id/categories/:item_id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/v1/containers/:id/topics",
            get(topics::list_topics).post(topics::create_topic),
        )
        .route(
            "/api/v1/containers/:id/topics/reorder",
            post(topics::reorder_topics),
        )
        .route(
            "/api/v1/containers/:id/topics/:item_id",
            get(topics::get_topic)
                .put(topics::update_topic)
                .delete(topics::delete_topic),
        )
        .route(
            "/api/v1/containers/:id/factors",
            get(factors::list_factors).post(factors::create_factor),
        )
        .route(
            "/api/v1/containers/:id/factors/reorder",
            post(factors::reorder_factors),
        )
        .route(
            "/api/v1/containers/:id/factors/:item_id",
            get(factors::get_factor)
                .put(factors::update_factor)
                .delete(factors::delete_factor),
        )
        .route(
            "/api/v1/containers/:id/contents",
            get(contents::list_contents).post(contents::create_content),
        )
        .route(
            "/api/v1/containers/:id/contents/reorder",
            post(contents::reorder_contents),
        )
        .route(
            "/api/v1/containers/:id/contents/:item_id",
            get(contents::get_content)
                .put(contents::update_content)
                .delete(contents::delete_content),
        )
        .route(
            "/api/v1/containers/:id/export",
            get(spreadsheet::export_structure),
        )
        .route(
            "/api/v1/containers/:id/import",
            post(spreadsheet::import_structure),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
