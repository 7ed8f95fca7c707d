use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog & Account Entities
// ============================================================================
//
// Read-only from the order engine's point of view, except for the
// availability / open flags toggled by their owners.
//
// ============================================================================

/// Customers are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Flat charge added to every order, never negative.
    pub delivery_fee: Decimal,
    /// Open for orders.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub available: bool,
    pub restaurant_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub delivery_fee: Decimal,
}

impl From<&Restaurant> for RestaurantSummary {
    fn from(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name.clone(),
            category: restaurant.category.clone(),
            delivery_fee: restaurant.delivery_fee,
        }
    }
}
