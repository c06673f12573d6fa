use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{AppError, FieldError};
use crate::geo::{format_distance, Coordinate, GeoConfig};
use crate::models::cart::Cart;
use crate::models::order::{NewOrder, OrderRecord};
use crate::money::Money;
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable")]
    Unavailable,
}

/// External geolocation collaborator. In production this is whatever resolved
/// the customer's position (the storefront reports it with the request); tests
/// substitute fixed or failing providers.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Result<Coordinate, LocationError>;
}

/// A client-reported position, the usual provider behind the HTTP API.
pub struct ReportedLocation(pub Option<Coordinate>);

impl LocationProvider for ReportedLocation {
    fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}

/// The delivery-information form the customer fills in at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment_method: String,
}

/// Result of the storefront's delivery pre-flight check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCheck {
    pub deliverable: bool,
    pub distance_km: f64,
    pub distance: String,
}

fn email_is_plausible(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

/// Builds a well-formed pending order from the submitted cart, form, and
/// resolved location, or rejects it. All failing fields are reported together;
/// an undeliverable location is a distinct error carrying the computed
/// distance. Pure: persistence is the caller's next step.
pub fn build_pending_order(
    cart: &Cart,
    form: &CheckoutForm,
    location: Option<&Coordinate>,
    geo: &GeoConfig,
    delivery_fee: Money,
    user_id: &str,
) -> Result<NewOrder, AppError> {
    let mut fields = Vec::new();

    if form.name.trim().is_empty() {
        fields.push(FieldError::new("name", "name is required"));
    }
    if form.address.trim().is_empty() {
        fields.push(FieldError::new("address", "address is required"));
    }
    if form.phone.trim().is_empty() {
        fields.push(FieldError::new("phone", "phone is required"));
    }
    if !email_is_plausible(&form.email) {
        fields.push(FieldError::new("email", "email address looks invalid"));
    }
    if cart.is_empty() {
        fields.push(FieldError::new("cart", "cart is empty"));
    }
    let location = match location {
        Some(point) => point,
        None => {
            fields.push(FieldError::new("location", "location could not be resolved"));
            return Err(AppError::Validation { fields });
        }
    };

    if !fields.is_empty() {
        return Err(AppError::Validation { fields });
    }

    let distance_km = geo.distance_to_shop(location)?;
    if distance_km > geo.max_radius_km() {
        return Err(AppError::OutOfDeliveryRange { distance_km });
    }

    Ok(NewOrder {
        customer_name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
        email: Some(form.email.trim().to_string()),
        phone: Some(form.phone.trim().to_string()),
        items: cart.line_descriptions(),
        total: cart.subtotal() + delivery_fee,
        customer_location: Some(*location),
        user_id: user_id.to_string(),
        payment_method: form.payment_method.clone(),
    })
}

/// Glues cart + form + location into a validated order and persists it.
pub struct CheckoutService {
    store: Arc<dyn OrderStore>,
    geo: GeoConfig,
    delivery_fee: Money,
    metrics: Metrics,
}

impl CheckoutService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        geo: GeoConfig,
        delivery_fee: Money,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            geo,
            delivery_fee,
            metrics,
        }
    }

    /// Validates and persists one order. Nothing is written unless every
    /// check passes; a failed location resolution fails validation rather
    /// than assuming the address is deliverable.
    pub async fn submit(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
        location: &dyn LocationProvider,
        user_id: &str,
    ) -> Result<OrderRecord, AppError> {
        let resolved = match location.current_location() {
            Ok(point) => Some(point),
            Err(err) => {
                warn!(error = %err, "checkout location resolution failed");
                None
            }
        };

        let candidate = build_pending_order(
            cart,
            form,
            resolved.as_ref(),
            &self.geo,
            self.delivery_fee,
            user_id,
        )
        .inspect_err(|err| {
            let outcome = match err {
                AppError::OutOfDeliveryRange { .. } => "out_of_range",
                _ => "rejected",
            };
            self.metrics
                .orders_placed_total
                .with_label_values(&[outcome])
                .inc();
        })?;

        let order = self.store.create(candidate).await.map_err(|err| {
            self.metrics
                .orders_placed_total
                .with_label_values(&["store_error"])
                .inc();
            AppError::from(err)
        })?;

        self.metrics
            .orders_placed_total
            .with_label_values(&["placed"])
            .inc();
        self.metrics.pending_orders.inc();

        info!(
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "order placed"
        );

        Ok(order)
    }

    /// Read-only eligibility check for the storefront's "can you deliver to
    /// me" widget.
    pub fn delivery_check(&self, point: &Coordinate) -> Result<DeliveryCheck, AppError> {
        let distance_km = self.geo.distance_to_shop(point)?;

        Ok(DeliveryCheck {
            deliverable: distance_km <= self.geo.max_radius_km(),
            distance_km,
            distance: format_distance(distance_km),
        })
    }
}
