use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{OrderLineItem, OrderNumber, OrderStatus};

// ============================================================================
// Order Events - facts recorded alongside every order write
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    StatusChanged(OrderStatusChanged),
    Cancelled(OrderCancelled),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.placed_at,
            OrderEvent::StatusChanged(e) => e.changed_at,
            OrderEvent::Cancelled(e) => e.cancelled_at,
        }
    }
}

/// Initial event in the order lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub order_number: OrderNumber,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLineItem>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub from: OrderStatus,
    pub reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: DateTime<Utc>,
}
