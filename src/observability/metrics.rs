use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounterVec,
    pub pending_orders: IntGauge,
    pub accept_attempts_total: IntCounterVec,
    pub delivery_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_placed_total = IntCounterVec::new(
            Opts::new("orders_placed_total", "Checkout submissions by outcome"),
            &["outcome"],
        )
        .expect("valid orders_placed_total metric");

        let pending_orders = IntGauge::new(
            "pending_orders",
            "Orders currently waiting for a delivery partner",
        )
        .expect("valid pending_orders metric");

        let accept_attempts_total = IntCounterVec::new(
            Opts::new(
                "accept_attempts_total",
                "Order acceptance attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid accept_attempts_total metric");

        let delivery_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "delivery_duration_seconds",
            "Time from order placement to delivery in seconds",
        ))
        .expect("valid delivery_duration_seconds metric");

        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");
        registry
            .register(Box::new(pending_orders.clone()))
            .expect("register pending_orders");
        registry
            .register(Box::new(accept_attempts_total.clone()))
            .expect("register accept_attempts_total");
        registry
            .register(Box::new(delivery_duration_seconds.clone()))
            .expect("register delivery_duration_seconds");

        Self {
            registry,
            orders_placed_total,
            pending_orders,
            accept_attempts_total,
            delivery_duration_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
