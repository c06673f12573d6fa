pub mod checkout;
pub mod delivery;
pub mod menu;
pub mod ws;

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::store::{OrderStore, StatusFilter};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(menu::router())
        .merge(checkout::router())
        .merge(delivery::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

/// The current actor, as asserted by the fronting auth proxy through
/// `x-actor-*` headers. Requests without identity headers act as a guest
/// customer; a malformed role is rejected outright.
pub struct Actor(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let identity = match (header("x-actor-id"), header("x-actor-role")) {
            (Some(id), Some(role)) => Identity {
                id,
                display_name: header("x-actor-name"),
                phone: header("x-actor-phone"),
                role: role.parse().map_err(AppError::BadRequest)?,
            },
            _ => Identity::guest(),
        };

        Ok(Actor(identity))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    flavors: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let orders = state.store.query_by_status(StatusFilter::Any).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        orders: orders.len(),
        flavors: state.catalog.len(),
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
