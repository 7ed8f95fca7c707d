use uuid::Uuid;

use super::value_objects::{OrderLineItem, OrderStatus};

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

/// Input of the order creation workflow.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlaceOrder {
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Commands applied to an existing order by the lifecycle manager.
#[derive(Debug, Clone)]
pub enum OrderCommand {
    ChangeStatus {
        to: OrderStatus,
    },
    Cancel {
        reason: Option<String>,
        cancelled_by: Option<Uuid>,
    },
}
