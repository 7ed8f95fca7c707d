use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CustomerDirectory, OrderFilter, OrderRepository, Page, PageRequest, ProductCatalog,
    RestaurantDirectory, StoreError,
};
use crate::domain::catalog::{Customer, Product, Restaurant};
use crate::domain::order::{Order, OrderEvent};

// ============================================================================
// In-memory store
// ============================================================================
//
// Every order write happens under one write lock, which makes the
// number-uniqueness check, the version compare-and-swap and the outbox
// append a single atomic step.
//
// ============================================================================

#[derive(Default)]
struct OrderTables {
    orders: HashMap<Uuid, Order>,
    numbers: HashMap<String, Uuid>,
    outbox: Vec<(Uuid, OrderEvent)>,
}

#[derive(Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<Uuid, Customer>>,
    restaurants: RwLock<HashMap<Uuid, Restaurant>>,
    products: RwLock<HashMap<Uuid, Product>>,
    orders: RwLock<OrderTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id, customer);
    }

    pub async fn insert_restaurant(&self, restaurant: Restaurant) {
        self.restaurants.write().await.insert(restaurant.id, restaurant);
    }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.orders.len()
    }

    /// Events recorded for one order, oldest first.
    pub async fn events_for(&self, order_id: Uuid) -> Vec<OrderEvent> {
        self.orders
            .read()
            .await
            .outbox
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    fn paginate(mut matching: Vec<Order>, page: PageRequest) -> Page<Order> {
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Page::new(items, page, total)
    }

    async fn select_orders(&self, predicate: impl Fn(&Order) -> bool, page: PageRequest) -> Page<Order> {
        let tables = self.orders.read().await;
        let matching = tables.orders.values().filter(|o| predicate(*o)).cloned().collect();
        Self::paginate(matching, page)
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl RestaurantDirectory for MemoryStore {
    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        Ok(self.restaurants.read().await.get(&id).cloned())
    }

    async fn save_restaurant(&self, restaurant: &Restaurant) -> Result<Restaurant, StoreError> {
        self.restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant.clone());
        Ok(restaurant.clone())
    }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn save_product(&self, product: &Product) -> Result<Product, StoreError> {
        self.products.write().await.insert(product.id, product.clone());
        Ok(product.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.orders.get(&id).cloned())
    }

    async fn insert_order(&self, order: &Order, events: &[OrderEvent]) -> Result<Order, StoreError> {
        let mut tables = self.orders.write().await;

        if tables.numbers.contains_key(order.order_number.as_str()) {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.to_string()));
        }

        tables.numbers.insert(order.order_number.to_string(), order.id);
        tables.orders.insert(order.id, order.clone());
        tables
            .outbox
            .extend(events.iter().map(|event| (order.id, event.clone())));

        Ok(order.clone())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: i64,
        events: &[OrderEvent],
    ) -> Result<Order, StoreError> {
        let mut tables = self.orders.write().await;

        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or(StoreError::Missing(order.id))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: order.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        *stored = order.clone();
        tables
            .outbox
            .extend(events.iter().map(|event| (order.id, event.clone())));

        Ok(order.clone())
    }

    async fn find_by_customer(&self, customer_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError> {
        Ok(self.select_orders(|o| o.customer_id == customer_id, page).await)
    }

    async fn find_by_restaurant(&self, restaurant_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError> {
        Ok(self.select_orders(|o| o.restaurant_id == restaurant_id, page).await)
    }

    async fn find_all(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>, StoreError> {
        Ok(self.select_orders(|o| filter.matches(o), page).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderLineItem, OrderNumber, OrderStatus, PlaceOrder};
    use rust_decimal_macros::dec;

    fn new_order(customer_id: Uuid, number: &str) -> (Order, OrderEvent) {
        let request = PlaceOrder {
            customer_id,
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderLineItem::new(Uuid::new_v4(), 1)],
            notes: None,
        };
        Order::place(request, OrderNumber::new(number), dec!(9.90))
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_order_number() {
        let store = MemoryStore::new();
        let (first, event) = new_order(Uuid::new_v4(), "ORD-AAAAAAAAAA");
        let (second, _) = new_order(Uuid::new_v4(), "ORD-AAAAAAAAAA");

        store.insert_order(&first, &[event]).await.unwrap();
        let result = store.insert_order(&second, &[]).await;

        assert!(matches!(result, Err(StoreError::DuplicateOrderNumber(_))));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap_on_version() {
        let store = MemoryStore::new();
        let (order, event) = new_order(Uuid::new_v4(), "ORD-BBBBBBBBBB");
        store.insert_order(&order, &[event]).await.unwrap();

        let mut confirmed = order.clone();
        confirmed.status = OrderStatus::Confirmed;
        confirmed.version = 2;
        store.update_order(&confirmed, 1, &[]).await.unwrap();

        // A second writer still holding version 1 loses
        let mut cancelled = order.clone();
        cancelled.status = OrderStatus::Cancelled;
        cancelled.version = 2;
        let result = store.update_order(&cancelled, 1, &[]).await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected: 1, actual: 2, .. })
        ));
        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_update_of_unknown_order_fails() {
        let store = MemoryStore::new();
        let (order, _) = new_order(Uuid::new_v4(), "ORD-CCCCCCCCCC");
        assert!(matches!(
            store.update_order(&order, 1, &[]).await,
            Err(StoreError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_customer_pages_newest_first() {
        let store = MemoryStore::new();
        let customer_id = Uuid::new_v4();

        let mut ids = Vec::new();
        for i in 0..3 {
            let (mut order, event) = new_order(customer_id, &format!("ORD-PAGE{i:06}"));
            order.created_at += chrono::Duration::minutes(i);
            ids.push(order.id);
            store.insert_order(&order, &[event]).await.unwrap();
        }
        let (other, event) = new_order(Uuid::new_v4(), "ORD-OTHER00000");
        store.insert_order(&other, &[event]).await.unwrap();

        let page = store
            .find_by_customer(customer_id, PageRequest::new(0, 2))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, ids[2]);
        assert_eq!(page.items[1].id, ids[1]);

        let second = store
            .find_by_customer(customer_id, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_outbox_keeps_events_per_order() {
        let store = MemoryStore::new();
        let (order, event) = new_order(Uuid::new_v4(), "ORD-DDDDDDDDDD");
        store.insert_order(&order, &[event.clone()]).await.unwrap();

        assert_eq!(store.events_for(order.id).await, vec![event]);
        assert!(store.events_for(Uuid::new_v4()).await.is_empty());
    }
}
