use std::sync::Arc;

use crate::catalog::Catalog;
use crate::checkout::CheckoutService;
use crate::config::Config;
use crate::delivery::AssignmentService;
use crate::error::AppError;
use crate::geo::GeoConfig;
use crate::observability::metrics::Metrics;
use crate::store::memory::MemoryOrderStore;
use crate::store::OrderStore;

/// Everything the handlers need, wired once at startup. Configuration is
/// injected here rather than read from globals anywhere else.
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub catalog: Catalog,
    pub checkout: CheckoutService,
    pub assignments: AssignmentService,
    pub geo: GeoConfig,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let geo = GeoConfig::new(config.shop_location(), config.max_delivery_radius_km)?;
        let metrics = Metrics::new();

        let store: Arc<dyn OrderStore> =
            Arc::new(MemoryOrderStore::new(config.event_buffer_size));

        let checkout = CheckoutService::new(
            store.clone(),
            geo,
            config.delivery_fee(),
            metrics.clone(),
        );
        let assignments = AssignmentService::new(store.clone(), metrics.clone());

        Ok(Self {
            store,
            catalog: Catalog::seeded(),
            checkout,
            assignments,
            geo,
            metrics,
        })
    }
}
