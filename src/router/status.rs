//! Public instance status and Prometheus metrics.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::config::Configuration;

/// Structured configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
    pub url: String,
    pub version: String,
}

/// Public server status (configuration).
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        name: config.name.clone(),
        url: config.url.clone(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Prometheus exposition, when a recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_status() {
        let (state, _) = router::state();
        let app = app(state);

        let response =
            make_request(app, Method::GET, "/status.json", String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Status = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (state, _) = router::state();
        let app = app(state);

        let response =
            make_request(app, Method::GET, "/metrics", String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
