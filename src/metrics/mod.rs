mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

pub use server::start_metrics_server;

use crate::domain::order::OrderStatus;
use crate::error::ErrorKind;

// ============================================================================
// Metrics - Prometheus counters for the order engine
// ============================================================================
//
// - order creation (count, latency, number collisions)
// - status transitions by from/to pair
// - failed operations by operation name and error kind
//
// Each Metrics value owns its own Registry so tests do not share counters.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub order_creation_duration: Histogram,
    pub order_number_retries: IntCounter,
    pub status_transitions: IntCounterVec,
    pub operation_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders placed")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_creation_duration = Histogram::with_opts(
            HistogramOpts::new("order_creation_duration_seconds", "Order placement duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(order_creation_duration.clone()))?;

        let order_number_retries = IntCounter::new(
            "order_number_retries_total",
            "Order number collisions that forced a new number",
        )?;
        registry.register(Box::new(order_number_retries.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Applied order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let operation_failures = IntCounterVec::new(
            Opts::new("order_operation_failures_total", "Failed order operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operation_failures.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_creation_duration,
            order_number_retries,
            status_transitions,
            operation_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, duration_secs: f64) {
        self.orders_created.inc();
        self.order_creation_duration.observe(duration_secs);
    }

    pub fn record_order_number_retry(&self) {
        self.order_number_retries.inc();
    }

    pub fn record_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.status_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    pub fn record_failure(&self, operation: &str, kind: ErrorKind) {
        self.operation_failures
            .with_label_values(&[operation, kind.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> Option<f64> {
        metrics
            .registry()
            .gather()
            .iter()
            .find(|family| family.name() == name)
            .and_then(|family| family.metric.first().and_then(|m| m.counter.value))
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created(0.01);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_order_created() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created(0.02);
        metrics.record_order_created(0.03);
        assert_eq!(counter_value(&metrics, "orders_created_total"), Some(2.0));
    }

    #[test]
    fn test_record_transition_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition(OrderStatus::Pending, OrderStatus::Confirmed);
        metrics.record_transition(OrderStatus::Confirmed, OrderStatus::OutForDelivery);
        metrics.record_transition(OrderStatus::Pending, OrderStatus::Confirmed);

        let gathered = metrics.registry().gather();
        let transitions = gathered
            .iter()
            .find(|m| m.name() == "order_status_transitions_total")
            .unwrap();
        assert_eq!(transitions.metric.len(), 2);
    }

    #[test]
    fn test_record_failure() {
        let metrics = Metrics::new().unwrap();
        metrics.record_failure("create_order", ErrorKind::BusinessRuleViolation);
        assert_eq!(counter_value(&metrics, "order_operation_failures_total"), Some(1.0));
    }

    #[test]
    fn test_separate_instances_do_not_share_counters() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_order_number_retry();
        assert_eq!(counter_value(&first, "order_number_retries_total"), Some(1.0));
        assert_eq!(second.order_number_retries.get(), 0);
    }
}
