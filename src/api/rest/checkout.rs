use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::Actor;
use crate::checkout::{CheckoutForm, DeliveryCheck, ReportedLocation};
use crate::error::AppError;
use crate::geo::Coordinate;
use crate::models::cart::Cart;
use crate::models::order::OrderRecord;
use crate::state::AppState;
use crate::store::OrderStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(submit_order))
        .route("/orders/:id", get(get_order))
        .route("/delivery-check", get(delivery_check))
}

#[derive(Deserialize)]
pub struct SubmitOrderRequest {
    pub cart: Cart,
    pub form: CheckoutForm,
    pub location: Option<Coordinate>,
}

async fn submit_order(
    State(state): State<Arc<AppState>>,
    Actor(identity): Actor,
    Json(payload): Json<SubmitOrderRequest>,
) -> Result<Json<OrderRecord>, AppError> {
    let location = ReportedLocation(payload.location);
    let order = state
        .checkout
        .submit(&payload.cart, &payload.form, &location, &identity.id)
        .await?;

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>, AppError> {
    Ok(Json(state.store.get(id).await?))
}

#[derive(Deserialize)]
pub struct DeliveryCheckQuery {
    pub lat: f64,
    pub lng: f64,
}

async fn delivery_check(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeliveryCheckQuery>,
) -> Result<Json<DeliveryCheck>, AppError> {
    let point = Coordinate::new(query.lat, query.lng);
    Ok(Json(state.checkout.delivery_check(&point)?))
}
