use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::OrderLineItem;
use crate::store::ProductCatalog;

// ============================================================================
// Pricing Calculator
// ============================================================================
//
// total = sum(price * quantity) + delivery fee, in exact decimal arithmetic.
// Every product must exist, be available and belong to the restaurant the
// order is placed against. The first failing item aborts the computation.
// A total above MAX_ORDER_TOTAL is rejected, so a priced order always fits
// the stored total_amount column.
//
// ============================================================================

/// Largest total an order may carry: 9,999,999,999.99, the range of
/// `orders.total_amount NUMERIC(12,2)`.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

#[derive(Clone)]
pub struct PricingCalculator {
    products: Arc<dyn ProductCatalog>,
}

impl PricingCalculator {
    pub fn new(products: Arc<dyn ProductCatalog>) -> Self {
        Self { products }
    }

    pub async fn compute_total(
        &self,
        items: &[OrderLineItem],
        restaurant_id: Uuid,
        delivery_fee: Decimal,
    ) -> Result<Decimal, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        let out_of_range = || OrderError::AmountOutOfRange {
            restaurant_id,
            max: MAX_ORDER_TOTAL,
        };
        let mut subtotal = Decimal::ZERO;

        for item in items {
            let product = self
                .products
                .find_product(item.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(item.product_id))?;

            if !product.available {
                return Err(OrderError::ProductUnavailable {
                    product_id: product.id,
                    name: product.name,
                });
            }

            if product.restaurant_id != restaurant_id {
                return Err(OrderError::ProductRestaurantMismatch {
                    product_id: product.id,
                    name: product.name,
                    restaurant_id,
                });
            }

            subtotal = product
                .price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line| subtotal.checked_add(line))
                .filter(|sum| *sum <= MAX_ORDER_TOTAL)
                .ok_or_else(out_of_range)?;
        }

        let total = subtotal
            .checked_add(delivery_fee)
            .filter(|total| *total <= MAX_ORDER_TOTAL)
            .ok_or_else(out_of_range)?;

        tracing::debug!(%restaurant_id, %subtotal, %delivery_fee, "Priced order items");
        Ok(total)
    }
}
