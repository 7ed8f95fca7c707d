use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::OrderStatus;
use crate::metrics::Metrics;
use crate::store::OrderRepository;

// ============================================================================
// Order Lifecycle Manager
// ============================================================================
//
// Orchestrates: Command → Order → Events → Repository
//
// The write is a compare-and-swap on the version the order was loaded with,
// so two racing transitions cannot both land. Status changes never touch the
// total amount.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
    metrics: Arc<Metrics>,
}

impl OrderLifecycle {
    pub fn new(orders: Arc<dyn OrderRepository>, metrics: Arc<Metrics>) -> Self {
        Self { orders, metrics }
    }

    /// Move `order` to `to`. Re-requesting the current non-terminal status
    /// succeeds without a write.
    pub async fn transition(&self, order: Order, to: OrderStatus) -> Result<Order, OrderError> {
        self.execute(order, OrderCommand::ChangeStatus { to }).await
    }

    pub async fn cancel(
        &self,
        order: Order,
        reason: Option<String>,
        cancelled_by: Option<Uuid>,
    ) -> Result<Order, OrderError> {
        self.execute(order, OrderCommand::Cancel { reason, cancelled_by })
            .await
    }

    async fn execute(&self, mut order: Order, command: OrderCommand) -> Result<Order, OrderError> {
        let events = order.handle_command(&command).map_err(|e| {
            tracing::warn!(order_id = %order.id, status = %order.status, error = %e, "Rejected order command");
            e
        })?;

        if events.is_empty() {
            tracing::debug!(order_id = %order.id, status = %order.status, "Status unchanged");
            return Ok(order);
        }

        let expected_version = order.version;
        let from = order.status;
        for event in &events {
            order.apply_event(event);
        }

        let saved = self
            .orders
            .update_order(&order, expected_version, &events)
            .await?;

        for event in &events {
            if let Some((from, to)) = transition_of(event) {
                self.metrics.record_transition(from, to);
            }
        }

        tracing::info!(
            order_id = %saved.id,
            order_number = %saved.order_number,
            from = %from,
            to = %saved.status,
            version = saved.version,
            "Order status changed"
        );

        Ok(saved)
    }
}

fn transition_of(event: &OrderEvent) -> Option<(OrderStatus, OrderStatus)> {
    match event {
        OrderEvent::Placed(_) => None,
        OrderEvent::StatusChanged(e) => Some((e.from, e.to)),
        OrderEvent::Cancelled(e) => Some((e.from, OrderStatus::Cancelled)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderLineItem, OrderNumber, PlaceOrder};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    async fn setup() -> (Arc<MemoryStore>, OrderLifecycle, Order) {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = OrderLifecycle::new(store.clone(), Arc::new(Metrics::new().unwrap()));

        let request = PlaceOrder {
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderLineItem::new(Uuid::new_v4(), 1)],
            notes: None,
        };
        let (order, event) = Order::place(request, OrderNumber::generate(), dec!(33.00));
        store.insert_order(&order, &[event]).await.unwrap();

        (store, lifecycle, order)
    }

    #[tokio::test]
    async fn test_transition_persists_new_status_and_event() {
        let (store, lifecycle, order) = setup().await;

        let confirmed = lifecycle.transition(order.clone(), OrderStatus::Confirmed).await.unwrap();

        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(confirmed.version, 2);
        assert_eq!(confirmed.total_amount, dec!(33.00));

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored, confirmed);

        let events = store.events_for(order.id).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type(), "OrderStatusChanged");
    }

    #[tokio::test]
    async fn test_same_state_is_noop_without_write() {
        let (store, lifecycle, order) = setup().await;

        let unchanged = lifecycle.transition(order.clone(), OrderStatus::Pending).await.unwrap();

        assert_eq!(unchanged.version, 1);
        assert_eq!(store.events_for(order.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_skipping_a_step_is_rejected() {
        let (store, lifecycle, order) = setup().await;
        let confirmed = lifecycle.transition(order, OrderStatus::Confirmed).await.unwrap();

        let result = lifecycle.transition(confirmed.clone(), OrderStatus::Delivered).await;

        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Delivered
            })
        ));
        let stored = store.find_order(confirmed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_stale_order_loses_the_race() {
        let (store, lifecycle, order) = setup().await;

        lifecycle.transition(order.clone(), OrderStatus::Confirmed).await.unwrap();
        let result = lifecycle.cancel(order.clone(), None, None).await;

        assert!(matches!(result, Err(OrderError::ConcurrentModification(id)) if id == order.id));
        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_records_reason() {
        let (store, lifecycle, order) = setup().await;
        let admin = Uuid::new_v4();

        let cancelled = lifecycle
            .cancel(order.clone(), Some("customer called".into()), Some(admin))
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        match store.events_for(order.id).await.last() {
            Some(OrderEvent::Cancelled(e)) => {
                assert_eq!(e.reason.as_deref(), Some("customer called"));
                assert_eq!(e.cancelled_by, Some(admin));
            }
            other => panic!("expected a cancellation event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transition_is_counted() {
        let (_store, lifecycle, order) = setup().await;
        lifecycle.transition(order, OrderStatus::Confirmed).await.unwrap();

        let value = lifecycle
            .metrics
            .status_transitions
            .with_label_values(&["PENDING", "CONFIRMED"])
            .get();
        assert_eq!(value, 1);
    }
}
