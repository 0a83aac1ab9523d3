use crate::config::Config;
use crate::crud::diagram::DiagramStore;
use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
mod routers;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: DiagramStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = DiagramStore::new(config.data_dir.clone());
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let listen = config.listen;

    // Create shared state
    let shared_state = Arc::new(AppState::new(config));

    let app = create_router(shared_state)?;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Error binding {}", listen))?;
    log::info!("Listening on {}", listen);

    axum::serve(listener, app)
        .await
        .context("Error running the server")
}

// Create Router
pub fn create_router(shared_state: Arc<AppState>) -> anyhow::Result<Router> {
    let origin = shared_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .context("Invalid CORS origin")?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT])
        .allow_origin(origin)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    Ok(Router::new()
        .merge(routers::diagram::router(shared_state.clone()))
        .merge(routers::analysis::router(shared_state.clone()))
        .merge(routers::schema::router(shared_state))
        .layer(cors))
}
