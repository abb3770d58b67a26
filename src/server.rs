//! # Server Configuration
//!
//! This module contains the router assembly and startup wiring for the
//! repolink API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub crypto_key: CryptoKey,
}

impl AppState {
    /// Builds application state from validated configuration and a live pool.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let key_bytes = config
            .crypto_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("crypto key missing from validated configuration"))?;
        let crypto_key = CryptoKey::new(key_bytes)
            .map_err(|e| anyhow::anyhow!("invalid crypto key: {}", e))?;

        Ok(Self {
            db,
            config: Arc::new(config),
            crypto_key,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/connectors",
            post(handlers::connectors::create_connector).get(handlers::connectors::list_connectors),
        )
        .route(
            "/connectors/{id}",
            get(handlers::connectors::get_connector)
                .put(handlers::connectors::update_connector)
                .delete(handlers::connectors::delete_connector),
        )
        .route(
            "/connectors/{id}/clone",
            post(handlers::connectors::clone_connector),
        )
        .route("/files", post(handlers::files::upload_file))
        .route("/files/{id}", get(handlers::files::get_file))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Runs database migrations and starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let db = crate::db::init_pool(&config).await?;
    migration::Migrator::up(&db, None).await?;

    let addr = config.bind_addr()?;
    let state = AppState::new(config, db)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::connectors::create_connector,
        crate::handlers::connectors::list_connectors,
        crate::handlers::connectors::get_connector,
        crate::handlers::connectors::update_connector,
        crate::handlers::connectors::delete_connector,
        crate::handlers::connectors::clone_connector,
        crate::handlers::files::upload_file,
        crate::handlers::files::get_file,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::registry::ConnectorPayload,
            crate::registry::ConnectorPatch,
            crate::registry::ConnectorDetails,
            crate::registry::ConnectorCredentials,
            crate::registry::KeyMaterial,
            crate::registry::OrganizationRef,
            crate::handlers::connectors::ConnectorRecord,
            crate::handlers::files::UploadFileRequest,
            crate::handlers::files::UploadedFileInfo,
            crate::cloner::ClonedRepository,
            crate::error::ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Repolink API",
        description = "Git repository connector registry and clone service",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
