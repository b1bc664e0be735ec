pub mod auth;
pub mod config;
pub mod error;
pub mod resource;
pub mod upstream;

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use resgate::token::Secret;
use serde_json::{json, Value};

use crate::{config::Config, upstream::UpstreamClient};

#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub secret: Arc<Secret>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            upstream: UpstreamClient::new(config)?,
            secret: Arc::new(Secret::new(config.jwt_secret.as_bytes())),
        })
    }
}

/// Resource routes sit behind the bearer-token check; `/status` does not.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/resources/:id", get(resource::get_resource))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .route("/status", get(status))
        .with_state(state)
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
