use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::OrderStatus;
use crate::error::ErrorKind;
use crate::store::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: u32 },

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product unavailable: {name}")]
    ProductUnavailable { product_id: Uuid, name: String },

    #[error("Product {name} does not belong to restaurant {restaurant_id}")]
    ProductRestaurantMismatch {
        product_id: Uuid,
        name: String,
        restaurant_id: Uuid,
    },

    #[error("Order total for restaurant {restaurant_id} exceeds the maximum of {max}")]
    AmountOutOfRange { restaurant_id: Uuid, max: Decimal },

    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error("Inactive customer cannot place orders: {0}")]
    CustomerInactive(Uuid),

    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(Uuid),

    #[error("Restaurant is not accepting orders: {0}")]
    RestaurantClosed(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Cannot cancel an order that is {0}")]
    CancellationNotAllowed(OrderStatus),

    #[error("Access denied")]
    AccessDenied,

    #[error("Order number already taken: {0}")]
    DuplicateOrderNumber(String),

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::ProductNotFound(_)
            | OrderError::CustomerNotFound(_)
            | OrderError::RestaurantNotFound(_)
            | OrderError::OrderNotFound(_) => ErrorKind::NotFound,

            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::ProductUnavailable { .. }
            | OrderError::ProductRestaurantMismatch { .. }
            | OrderError::AmountOutOfRange { .. }
            | OrderError::CustomerInactive(_)
            | OrderError::RestaurantClosed(_)
            | OrderError::InvalidTransition { .. }
            | OrderError::CancellationNotAllowed(_) => ErrorKind::BusinessRuleViolation,

            OrderError::DuplicateOrderNumber(_) | OrderError::ConcurrentModification(_) => {
                ErrorKind::Conflict
            }

            OrderError::AccessDenied => ErrorKind::AccessDenied,

            OrderError::Storage(_) => ErrorKind::Unexpected,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { id, .. } => OrderError::ConcurrentModification(id),
            StoreError::DuplicateOrderNumber(number) => OrderError::DuplicateOrderNumber(number),
            other => OrderError::Storage(other),
        }
    }
}

/// Only an order-number collision is worth another attempt: the next
/// attempt draws a different number.
impl IsTransient for OrderError {
    fn is_transient(&self) -> bool {
        matches!(self, OrderError::DuplicateOrderNumber(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failures_are_business_rule_violations() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered,
        };
        assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
        assert_eq!(err.to_string(), "Cannot move order from PENDING to DELIVERED");

        assert_eq!(OrderError::EmptyOrder.kind(), ErrorKind::BusinessRuleViolation);
        assert_eq!(
            OrderError::CancellationNotAllowed(OrderStatus::Delivered).kind(),
            ErrorKind::BusinessRuleViolation
        );
    }

    #[test]
    fn test_store_conflicts_map_to_conflict_kind() {
        let id = Uuid::new_v4();
        let err: OrderError = StoreError::VersionConflict { id, expected: 1, actual: 2 }.into();
        assert!(matches!(err, OrderError::ConcurrentModification(x) if x == id));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: OrderError = StoreError::DuplicateOrderNumber("ORD-1".into()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_transient());
    }

    #[test]
    fn test_only_number_collisions_are_transient() {
        assert!(!OrderError::AccessDenied.is_transient());
        assert!(!OrderError::ConcurrentModification(Uuid::new_v4()).is_transient());
        assert!(!OrderError::Storage(StoreError::InvalidRecord("bad".into())).is_transient());
    }
}
