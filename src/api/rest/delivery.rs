use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::Actor;
use crate::delivery::Partner;
use crate::error::AppError;
use crate::models::identity::{Identity, Role};
use crate::models::order::OrderRecord;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/delivery/orders", get(list_assignable))
        .route("/delivery/orders/mine", get(list_mine))
        .route("/delivery/orders/:id/accept", post(accept_order))
        .route("/delivery/orders/:id/deliver", post(deliver_order))
}

/// Only delivery partners get at the dashboard. The partner's contact
/// snapshot comes from the identity headers; a partner without a display name
/// shows up as "Delivery Partner", same as the storefront always has.
fn require_partner(identity: &Identity) -> Result<Partner, AppError> {
    match identity.role {
        Role::Delivery => Ok(Partner {
            id: identity.id.clone(),
            name: identity
                .display_name
                .clone()
                .unwrap_or_else(|| "Delivery Partner".to_string()),
            phone: identity.phone.clone().unwrap_or_default(),
        }),
        Role::Customer | Role::Admin => {
            Err(AppError::Forbidden("delivery role required".to_string()))
        }
    }
}

async fn list_assignable(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    require_partner(&identity)?;
    Ok(Json(state.assignments.list_assignable().await?))
}

async fn list_mine(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    let partner = require_partner(&identity)?;
    Ok(Json(state.assignments.list_mine(&partner.id).await?))
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    let partner = require_partner(&identity)?;
    Ok(Json(state.assignments.accept(id, &partner).await?))
}

async fn deliver_order(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    let partner = require_partner(&identity)?;
    Ok(Json(state.assignments.deliver(id, &partner.id).await?))
}
