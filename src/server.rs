//! HTTP server.
//!
//! A single fallback handler answers every method on every path. The path
//! to resolve is read from the `q` query parameter (or the URI path) and
//! handed to the [`ResponseDispatcher`].

use crate::config::{self, PathSource, Settings};
use crate::dispatcher::{FakeResponse, ResponseDispatcher};
use crate::error::FakerError;
use crate::schema::Schema;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::Router;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Where each request gets its schema from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// Flattened once at startup, shared read-only
    Preloaded(Arc<Schema>),
    /// Read and flattened again for every request
    Reload(PathBuf),
}

/// Application state injected into the handler.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: ResponseDispatcher,
    pub schema: SchemaSource,
}

impl AppState {
    pub fn new(settings: Settings, schema: SchemaSource) -> Self {
        let dispatcher = ResponseDispatcher::new(settings.show_warnings);
        Self {
            settings,
            dispatcher,
            schema,
        }
    }

    /// Path to resolve for a request.
    fn request_path(&self, uri: &Uri, params: &HashMap<String, String>) -> String {
        match self.settings.path_source {
            PathSource::Query => params
                .get(&self.settings.query_param)
                .filter(|q| !q.is_empty())
                .cloned()
                .unwrap_or_else(|| "/".to_string()),
            PathSource::Uri => uri.path().to_string(),
        }
    }
}

/// Read and flatten a schema document.
///
/// Documents that cannot be read or decoded are reported to the client the
/// same way as documents without routes.
pub async fn load_schema(path: &Path) -> Result<Schema, FakerError> {
    let document = config::read_document_async(path).await.map_err(|e| {
        error!(error = %e, "Failed to load schema");
        FakerError::SchemaMissingRoutes
    })?;
    Schema::from_document(&document)
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(fake_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn fake_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> FakeResponse {
    let path = state.request_path(&uri, &params);

    match &state.schema {
        SchemaSource::Preloaded(schema) => {
            state
                .dispatcher
                .respond(schema, method.as_str(), &path)
                .await
        }
        SchemaSource::Reload(schema_path) => match load_schema(schema_path).await {
            Ok(schema) => {
                state
                    .dispatcher
                    .respond(&schema, method.as_str(), &path)
                    .await
            }
            Err(err) => FakeResponse::from_error(&err),
        },
    }
}

/// Serve until Ctrl-C.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(state.settings.listen).await?;
    info!(
        address = %listener.local_addr()?,
        reload = state.settings.reload_schema,
        path_source = ?state.settings.path_source,
        "HTTP server starting"
    );

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
