use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::Actor;
use crate::error::AppError;
use crate::models::flavor::{FlavorCategory, FlavorItem};
use crate::models::identity::{Identity, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/menu", get(list_flavors).post(add_flavor))
        .route("/menu/:id/availability", patch(set_availability))
}

fn require_admin(identity: &Identity) -> Result<(), AppError> {
    match identity.role {
        Role::Admin => Ok(()),
        Role::Customer | Role::Delivery => {
            Err(AppError::Forbidden("admin role required".to_string()))
        }
    }
}

#[derive(Deserialize)]
pub struct MenuQuery {
    pub category: Option<FlavorCategory>,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: u32,
}

async fn list_flavors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MenuQuery>,
) -> Json<Vec<FlavorItem>> {
    Json(state.catalog.list(query.category))
}

async fn add_flavor(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
    Json(flavor): Json<FlavorItem>,
) -> Result<Json<FlavorItem>, AppError> {
    require_admin(&identity)?;

    if flavor.id.trim().is_empty() {
        return Err(AppError::BadRequest("flavor id cannot be empty".to_string()));
    }
    if flavor.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "flavor name cannot be empty".to_string(),
        ));
    }

    Ok(Json(state.catalog.add(flavor)?))
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
    Path(id): Path<String>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<FlavorItem>, AppError> {
    require_admin(&identity)?;
    Ok(Json(state.catalog.set_available(&id, payload.available)?))
}
