use std::sync::Arc;
use uuid::Uuid;

use super::entities::{Product, Restaurant};
use super::errors::CatalogError;
use crate::auth::CallerIdentity;
use crate::metrics::Metrics;
use crate::store::{ProductCatalog, RestaurantDirectory};

// ============================================================================
// Catalog Service
// ============================================================================
//
// Owner-only toggles on the catalog: a product's availability and a
// restaurant's open flag. Admins may change either for any restaurant.
//
// ============================================================================

#[derive(Clone)]
pub struct CatalogService {
    restaurants: Arc<dyn RestaurantDirectory>,
    products: Arc<dyn ProductCatalog>,
    metrics: Arc<Metrics>,
}

impl CatalogService {
    pub fn new(
        restaurants: Arc<dyn RestaurantDirectory>,
        products: Arc<dyn ProductCatalog>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            restaurants,
            products,
            metrics,
        }
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn set_product_availability(
        &self,
        caller: &CallerIdentity,
        product_id: Uuid,
        available: bool,
    ) -> Result<Product, CatalogError> {
        let result = async {
            let mut product = self
                .products
                .find_product(product_id)
                .await?
                .ok_or(CatalogError::ProductNotFound(product_id))?;

            if !caller.guard().can_manage_product(&product) {
                return Err(CatalogError::AccessDenied);
            }

            product.available = available;
            let saved = self.products.save_product(&product).await?;
            tracing::info!(%product_id, available, "Product availability changed");
            Ok(saved)
        }
        .await;

        self.observe("set_product_availability", result)
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn set_restaurant_active(
        &self,
        caller: &CallerIdentity,
        restaurant_id: Uuid,
        active: bool,
    ) -> Result<Restaurant, CatalogError> {
        let result = async {
            if !caller.guard().can_manage_restaurant(restaurant_id) {
                return Err(CatalogError::AccessDenied);
            }

            let mut restaurant = self
                .restaurants
                .find_restaurant(restaurant_id)
                .await?
                .ok_or(CatalogError::RestaurantNotFound(restaurant_id))?;

            restaurant.active = active;
            let saved = self.restaurants.save_restaurant(&restaurant).await?;
            tracing::info!(%restaurant_id, active, "Restaurant open flag changed");
            Ok(saved)
        }
        .await;

        self.observe("set_restaurant_active", result)
    }

    fn observe<T>(&self, operation: &str, result: Result<T, CatalogError>) -> Result<T, CatalogError> {
        if let Err(e) = &result {
            self.metrics.record_failure(operation, e.kind());
            if let CatalogError::Storage(_) = e {
                tracing::error!(operation, error = %e, "Catalog operation failed");
            }
        }
        result
    }
}
