use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{OrderLineItem, OrderNumber, OrderStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Commands are validated against the current status and turned into events;
// events are the only thing that mutates an order. The total amount is fixed
// by the placement event and never recomputed afterwards.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub version: i64,

    // Current State
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLineItem>,
    pub notes: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new `PENDING` order from an already validated and priced request.
    pub fn place(
        request: PlaceOrder,
        order_number: OrderNumber,
        total_amount: Decimal,
    ) -> (Self, OrderEvent) {
        let placed = OrderPlaced {
            order_id: Uuid::now_v7(),
            order_number,
            customer_id: request.customer_id,
            restaurant_id: request.restaurant_id,
            items: request.items,
            total_amount,
            notes: request.notes,
            placed_at: Utc::now(),
        };

        (Self::from_placed(&placed), OrderEvent::Placed(placed))
    }

    fn from_placed(e: &OrderPlaced) -> Self {
        Self {
            id: e.order_id,
            order_number: e.order_number.clone(),
            version: 1,
            status: OrderStatus::Pending,
            total_amount: e.total_amount,
            customer_id: e.customer_id,
            restaurant_id: e.restaurant_id,
            items: e.items.clone(),
            notes: e.notes.clone(),
            created_at: e.placed_at,
            updated_at: e.placed_at,
        }
    }

    /// Validate a command against the transition table and emit the
    /// resulting events. An empty list means the command is a no-op.
    pub fn handle_command(&self, command: &OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        let now = Utc::now();

        match command {
            OrderCommand::ChangeStatus { to } => {
                let to = *to;

                if self.status.is_terminal() {
                    return Err(OrderError::InvalidTransition { from: self.status, to });
                }
                if to == self.status {
                    return Ok(vec![]);
                }
                if !self.status.can_transition_to(to) {
                    return Err(OrderError::InvalidTransition { from: self.status, to });
                }

                if to == OrderStatus::Cancelled {
                    return Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                        from: self.status,
                        reason: None,
                        cancelled_by: None,
                        cancelled_at: now,
                    })]);
                }

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to,
                    changed_at: now,
                })])
            }

            OrderCommand::Cancel { reason, cancelled_by } => {
                match self.status {
                    OrderStatus::OutForDelivery | OrderStatus::Delivered => {
                        return Err(OrderError::CancellationNotAllowed(self.status))
                    }
                    status if !status.can_transition_to(OrderStatus::Cancelled) => {
                        return Err(OrderError::InvalidTransition {
                            from: status,
                            to: OrderStatus::Cancelled,
                        })
                    }
                    _ => {}
                }

                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    from: self.status,
                    reason: reason.clone(),
                    cancelled_by: *cancelled_by,
                    cancelled_at: now,
                })])
            }
        }
    }

    /// Apply an event emitted by `handle_command`. Each applied event bumps
    /// the version by one.
    pub fn apply_event(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::Placed(_) => {
                // Already applied by `place`
                return;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
            }
            OrderEvent::Cancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }

        self.updated_at = event.occurred_at();
        self.version += 1;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn order_in(status: OrderStatus) -> Order {
        let request = PlaceOrder {
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderLineItem::new(Uuid::new_v4(), 2)],
            notes: Some("no onions".to_string()),
        };
        let (mut order, _) = Order::place(request, OrderNumber::generate(), dec!(33.00));
        order.status = status;
        order
    }

    fn change(order: &mut Order, to: OrderStatus) -> Result<(), OrderError> {
        let events = order.handle_command(&OrderCommand::ChangeStatus { to })?;
        for event in &events {
            order.apply_event(event);
        }
        Ok(())
    }

    #[test]
    fn test_place_creates_pending_order() {
        let request = PlaceOrder {
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderLineItem::new(Uuid::new_v4(), 1)],
            notes: None,
        };
        let customer_id = request.customer_id;

        let (order, event) = Order::place(request, OrderNumber::new("ORD-TEST000001"), dec!(12.50));

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version, 1);
        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.total_amount, dec!(12.50));
        assert_eq!(order.order_number.as_str(), "ORD-TEST000001");
        assert!(matches!(event, OrderEvent::Placed(ref e) if e.order_id == order.id));
    }

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Confirmed)]
    #[case(OrderStatus::Pending, OrderStatus::Cancelled)]
    #[case(OrderStatus::Confirmed, OrderStatus::OutForDelivery)]
    #[case(OrderStatus::Confirmed, OrderStatus::Cancelled)]
    #[case(OrderStatus::OutForDelivery, OrderStatus::Delivered)]
    fn test_allowed_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        let mut order = order_in(from);
        change(&mut order, to).unwrap();
        assert_eq!(order.status, to);
        assert_eq!(order.version, 2);
    }

    #[test]
    fn test_every_pair_outside_table_is_rejected() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                if from.can_transition_to(to) || (from == to && !from.is_terminal()) {
                    continue;
                }

                let mut order = order_in(from);
                let err = change(&mut order, to).unwrap_err();
                assert!(
                    matches!(err, OrderError::InvalidTransition { from: f, to: t } if f == from && t == to),
                    "{from} -> {to} should be rejected, got {err:?}"
                );
                assert_eq!(order.status, from);
            }
        }
    }

    #[rstest]
    #[case(OrderStatus::Pending)]
    #[case(OrderStatus::Confirmed)]
    #[case(OrderStatus::OutForDelivery)]
    fn test_same_state_is_a_no_op(#[case] status: OrderStatus) {
        let order = order_in(status);
        let events = order
            .handle_command(&OrderCommand::ChangeStatus { to: status })
            .unwrap();
        assert!(events.is_empty());
    }

    #[rstest]
    #[case(OrderStatus::Delivered)]
    #[case(OrderStatus::Cancelled)]
    fn test_terminal_rejects_same_state(#[case] status: OrderStatus) {
        let order = order_in(status);
        let result = order.handle_command(&OrderCommand::ChangeStatus { to: status });
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_confirmed_cannot_skip_to_delivered() {
        let mut order = order_in(OrderStatus::Pending);
        change(&mut order, OrderStatus::Confirmed).unwrap();

        let err = change(&mut order, OrderStatus::Delivered).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Delivered
            }
        ));
    }

    #[rstest]
    #[case(OrderStatus::OutForDelivery)]
    #[case(OrderStatus::Delivered)]
    fn test_cancel_rejected_once_dispatched(#[case] status: OrderStatus) {
        let order = order_in(status);
        let result = order.handle_command(&OrderCommand::Cancel { reason: None, cancelled_by: None });
        assert!(matches!(result, Err(OrderError::CancellationNotAllowed(s)) if s == status));
    }

    #[test]
    fn test_cancel_twice_is_invalid_transition() {
        let order = order_in(OrderStatus::Cancelled);
        let result = order.handle_command(&OrderCommand::Cancel { reason: None, cancelled_by: None });
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled
            })
        ));
    }

    #[test]
    fn test_cancel_records_reason_and_keeps_total() {
        let mut order = order_in(OrderStatus::Confirmed);
        let by = Uuid::new_v4();

        let events = order
            .handle_command(&OrderCommand::Cancel {
                reason: Some("customer changed mind".to_string()),
                cancelled_by: Some(by),
            })
            .unwrap();
        for event in &events {
            order.apply_event(event);
        }

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.total_amount, dec!(33.00));
        match &events[0] {
            OrderEvent::Cancelled(e) => {
                assert_eq!(e.from, OrderStatus::Confirmed);
                assert_eq!(e.cancelled_by, Some(by));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
