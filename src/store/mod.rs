// ============================================================================
// Store - Repository capabilities consumed by the order engine
// ============================================================================
//
// The engine only sees these traits. Two implementations ship with the
// crate:
// - MemoryStore: maps behind a tokio RwLock (tests, demo mode)
// - PgStore:     Postgres through sqlx
//
// Order writes carry the events they produced so both land atomically, and
// updates are compare-and-swap on the order version.
//
// ============================================================================

mod memory;
mod postgres;
mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::{demo_catalog, seed_memory_store, DemoCatalog};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::catalog::{Customer, Product, Restaurant};
use crate::domain::order::{Order, OrderEvent, OrderStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict { id: Uuid, expected: i64, actual: i64 },

    #[error("Order number already exists: {0}")]
    DuplicateOrderNumber(String),

    #[error("Record not found: {0}")]
    Missing(Uuid),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Paging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
        }
    }
}

/// Administrative order listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |status| order.status == status)
            && self.created_from.map_or(true, |from| order.created_at >= from)
            && self.created_to.map_or(true, |to| order.created_at <= to)
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    async fn exists_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.find_customer(id).await?.is_some())
    }
}

#[async_trait]
pub trait RestaurantDirectory: Send + Sync {
    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError>;

    async fn exists_restaurant(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.find_restaurant(id).await?.is_some())
    }

    async fn save_restaurant(&self, restaurant: &Restaurant) -> Result<Restaurant, StoreError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn save_product(&self, product: &Product) -> Result<Product, StoreError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Persist a brand-new order. Fails with `DuplicateOrderNumber` when the
    /// number is already taken; nothing is written in that case.
    async fn insert_order(&self, order: &Order, events: &[OrderEvent]) -> Result<Order, StoreError>;

    /// Overwrite an order if its stored version still equals
    /// `expected_version`, otherwise fail with `VersionConflict`.
    async fn update_order(
        &self,
        order: &Order,
        expected_version: i64,
        events: &[OrderEvent],
    ) -> Result<Order, StoreError>;

    /// Newest first.
    async fn find_by_customer(&self, customer_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError>;

    /// Newest first.
    async fn find_by_restaurant(&self, restaurant_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError>;

    /// Newest first.
    async fn find_all(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>, StoreError>;
}

/// The full set of collaborators, shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerDirectory>,
    pub restaurants: Arc<dyn RestaurantDirectory>,
    pub products: Arc<dyn ProductCatalog>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    /// Use one backing store for every capability.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CustomerDirectory + RestaurantDirectory + ProductCatalog + OrderRepository + 'static,
    {
        Self {
            customers: store.clone(),
            restaurants: store.clone(),
            products: store.clone(),
            orders: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 1_000).size, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_page_copies_request_metadata() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(1, 3), 9);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 3);
        assert_eq!(page.total, 9);
    }
}
