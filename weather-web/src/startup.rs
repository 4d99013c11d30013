use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use log::info;
use tower_http::services::ServeDir;
use weather_core::{Config, RequestHandler};

use crate::routes::{index_handler, weather_handler};

pub struct AppState {
    pub handler: RequestHandler,
    pub static_dir: String,
}

/// Build the shared state once at startup. Missing API keys or an invalid
/// timezone fail here rather than per request.
pub fn build_app_state(config: &Config, static_dir: String) -> anyhow::Result<AppState> {
    let handler = RequestHandler::from_config(config)?;
    Ok(AppState { handler, static_dir })
}

pub fn app(app_state: AppState) -> Router {
    let serve_static = ServeDir::new(&app_state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/weather", post(weather_handler))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .nest_service("/static", serve_static)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = Utc::now();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_string();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = Utc::now() - now;
    info!(
        target: "http_response",
        "response, code: {}, time: {}ms",
        response.status().as_str(),
        response_time.num_milliseconds()
    );

    response
}
