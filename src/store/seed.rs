use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::catalog::{Customer, Product, Restaurant};

// ============================================================================
// Demo data (in-memory store, or an empty database)
// ============================================================================

/// The demo rows, built once and written to whichever store is in use.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub customers: Vec<Customer>,
    pub restaurants: Vec<Restaurant>,
    pub products: Vec<Product>,
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn customer(name: &str, email: &str, days_ago: i64) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        active: true,
        created_at: Utc::now() - Duration::days(days_ago),
    }
}

fn restaurant(name: &str, category: &str, delivery_fee: Decimal) -> Restaurant {
    Restaurant {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: category.to_string(),
        delivery_fee,
        active: true,
    }
}

fn product(restaurant_id: Uuid, name: &str, description: &str, price: Decimal, category: &str) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(description.to_string()),
        price,
        category: category.to_string(),
        available: true,
        restaurant_id,
    }
}

/// Three customers, two restaurants and five products.
pub fn demo_catalog() -> DemoCatalog {
    let customers = vec![
        customer("Ana Julia", "ana.j@email.com", 30),
        customer("Bruno Costa", "bruno.costa@email.com", 12),
        customer("Carla Dias", "carla.d@email.com", 2),
    ];

    let indian = restaurant("Sabor da India", "Indian", money(700));
    let pastel = restaurant("O Rei do Pastel", "Snacks", money(300));

    let products = vec![
        product(indian.id, "Chicken Tikka Masala", "Chicken in a creamy spiced sauce", money(4550), "Main"),
        product(indian.id, "Samosa (2 pieces)", "Pastry filled with potato and peas", money(1500), "Starter"),
        product(pastel.id, "Meat Pastel", "Fried to order, ground beef", money(800), "Pastel"),
        product(pastel.id, "Cheese Pastel", "Fried to order, mozzarella", money(800), "Pastel"),
        product(pastel.id, "Sugarcane Juice 500ml", "Pure sugarcane juice", money(1000), "Drink"),
    ];

    DemoCatalog {
        customers,
        restaurants: vec![indian, pastel],
        products,
    }
}

impl DemoCatalog {
    pub fn log_ids(&self) {
        for c in &self.customers {
            tracing::info!(customer_id = %c.id, name = %c.name, "Demo customer");
        }
        for r in &self.restaurants {
            tracing::info!(restaurant_id = %r.id, name = %r.name, delivery_fee = %r.delivery_fee, "Demo restaurant");
        }
        for p in &self.products {
            tracing::info!(product_id = %p.id, restaurant_id = %p.restaurant_id, name = %p.name, price = %p.price, "Demo product");
        }
    }
}

pub async fn seed_memory_store(store: &MemoryStore, catalog: &DemoCatalog) {
    for c in &catalog.customers {
        store.insert_customer(c.clone()).await;
    }
    for r in &catalog.restaurants {
        store.insert_restaurant(r.clone()).await;
    }
    for p in &catalog.products {
        store.insert_product(p.clone()).await;
    }
    catalog.log_ids();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ProductCatalog, RestaurantDirectory};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_seeded_products_belong_to_seeded_restaurants() {
        let store = MemoryStore::new();
        let catalog = demo_catalog();
        seed_memory_store(&store, &catalog).await;

        assert_eq!(catalog.customers.len(), 3);
        let restaurant_ids: Vec<Uuid> = catalog.restaurants.iter().map(|r| r.id).collect();
        for p in &catalog.products {
            let stored = store.find_product(p.id).await.unwrap().unwrap();
            assert!(restaurant_ids.contains(&stored.restaurant_id));
        }

        let indian = store.find_restaurant(restaurant_ids[0]).await.unwrap().unwrap();
        assert_eq!(indian.delivery_fee, dec!(7.00));
    }
}
