use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::seed::DemoCatalog;
use super::{
    CustomerDirectory, OrderFilter, OrderRepository, Page, PageRequest, ProductCatalog,
    RestaurantDirectory, StoreError,
};
use crate::domain::catalog::{Customer, Product, Restaurant};
use crate::domain::order::{Order, OrderEvent, OrderLineItem, OrderNumber, OrderStatus};

// ============================================================================
// Postgres store
// ============================================================================
//
// Schema lives in ./migrations. Money is NUMERIC, line items are JSONB and
// the status column holds the plain status token.
//
// ============================================================================

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";
const UNIQUE_VIOLATION: &str = "23505";

const ORDER_COLUMNS: &str = "id, order_number, version, status, total_amount, customer_id, \
                             restaurant_id, items, notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    version: i64,
    status: String,
    total_amount: Decimal,
    customer_id: Uuid,
    restaurant_id: Uuid,
    items: Json<Vec<OrderLineItem>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::InvalidRecord(format!("order {}: {e}", row.id)))?;

        Ok(Order {
            id: row.id,
            order_number: OrderNumber::new(row.order_number),
            version: row.version,
            status,
            total_amount: row.total_amount,
            customer_id: row.customer_id,
            restaurant_id: row.restaurant_id,
            items: row.items.0,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn is_order_number_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db| {
        db.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db.constraint() == Some(ORDER_NUMBER_CONSTRAINT)
    })
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Write the demo catalog unless the database already holds customers.
    /// Returns whether anything was written.
    pub async fn seed_if_empty(&self, catalog: &DemoCatalog) -> Result<bool, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            tracing::info!(customers = count, "Database already has data, skipping demo seed");
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;
        for c in &catalog.customers {
            sqlx::query(
                "INSERT INTO customers (id, name, email, active, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(c.id)
            .bind(&c.name)
            .bind(&c.email)
            .bind(c.active)
            .bind(c.created_at)
            .execute(&mut *tx)
            .await?;
        }
        for r in &catalog.restaurants {
            sqlx::query(
                "INSERT INTO restaurants (id, name, category, delivery_fee, active) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(r.id)
            .bind(&r.name)
            .bind(&r.category)
            .bind(r.delivery_fee)
            .bind(r.active)
            .execute(&mut *tx)
            .await?;
        }
        for p in &catalog.products {
            sqlx::query(
                "INSERT INTO products (id, name, description, price, category, available, restaurant_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(p.id)
            .bind(&p.name)
            .bind(&p.description)
            .bind(p.price)
            .bind(&p.category)
            .bind(p.available)
            .bind(p.restaurant_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        catalog.log_ids();
        Ok(true)
    }

    async fn write_outbox(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order_id: Uuid,
        events: &[OrderEvent],
    ) -> Result<(), StoreError> {
        for event in events {
            sqlx::query(
                "INSERT INTO order_outbox (id, order_id, event_type, payload, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(event.event_type())
            .bind(Json(event))
            .bind(event.occurred_at())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn fetch_page(
        &self,
        mut query: QueryBuilder<'_, Postgres>,
        mut count: QueryBuilder<'_, Postgres>,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(&self.pool).await?;
        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(orders, page, total.max(0) as u64))
    }

    fn select_orders<'a>() -> (QueryBuilder<'a, Postgres>, QueryBuilder<'a, Postgres>) {
        (
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE")),
            QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE TRUE"),
        )
    }
}

#[async_trait]
impl CustomerDirectory for PgStore {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, active, created_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn exists_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl RestaurantDirectory for PgStore {
    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, category, delivery_fee, active FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restaurant)
    }

    async fn exists_restaurant(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM restaurants WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save_restaurant(&self, restaurant: &Restaurant) -> Result<Restaurant, StoreError> {
        let saved = sqlx::query_as::<_, Restaurant>(
            "INSERT INTO restaurants (id, name, category, delivery_fee, active)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 category = EXCLUDED.category,
                 delivery_fee = EXCLUDED.delivery_fee,
                 active = EXCLUDED.active
             RETURNING id, name, category, delivery_fee, active",
        )
        .bind(restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.category)
        .bind(restaurant.delivery_fee)
        .bind(restaurant.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category, available, restaurant_id
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn save_product(&self, product: &Product) -> Result<Product, StoreError> {
        let saved = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, price, category, available, restaurant_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 price = EXCLUDED.price,
                 category = EXCLUDED.category,
                 available = EXCLUDED.available,
                 restaurant_id = EXCLUDED.restaurant_id
             RETURNING id, name, description, price, category, available, restaurant_id",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.available)
        .bind(product.restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn insert_order(&self, order: &Order, events: &[OrderEvent]) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO orders (id, order_number, version, status, total_amount, customer_id,
                                 restaurant_id, items, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id)
        .bind(order.order_number.as_str())
        .bind(order.version)
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(order.customer_id)
        .bind(order.restaurant_id)
        .bind(Json(&order.items))
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            if is_order_number_violation(&err) {
                return Err(StoreError::DuplicateOrderNumber(order.order_number.to_string()));
            }
            return Err(err.into());
        }

        Self::write_outbox(&mut tx, order.id, events).await?;
        tx.commit().await?;

        tracing::debug!(order_id = %order.id, event_count = events.len(), "Inserted order");
        Ok(order.clone())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: i64,
        events: &[OrderEvent],
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET status = $1, version = $2, updated_at = $3
             WHERE id = $4 AND version = $5",
        )
        .bind(order.status.as_str())
        .bind(order.version)
        .bind(order.updated_at)
        .bind(order.id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match actual {
                Some(actual) => StoreError::VersionConflict {
                    id: order.id,
                    expected: expected_version,
                    actual,
                },
                None => StoreError::Missing(order.id),
            });
        }

        Self::write_outbox(&mut tx, order.id, events).await?;
        tx.commit().await?;

        tracing::debug!(
            order_id = %order.id,
            version = order.version,
            status = %order.status,
            "Updated order"
        );
        Ok(order.clone())
    }

    async fn find_by_customer(&self, customer_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError> {
        let (mut query, mut count) = Self::select_orders();
        query.push(" AND customer_id = ").push_bind(customer_id);
        count.push(" AND customer_id = ").push_bind(customer_id);
        self.fetch_page(query, count, page).await
    }

    async fn find_by_restaurant(&self, restaurant_id: Uuid, page: PageRequest) -> Result<Page<Order>, StoreError> {
        let (mut query, mut count) = Self::select_orders();
        query.push(" AND restaurant_id = ").push_bind(restaurant_id);
        count.push(" AND restaurant_id = ").push_bind(restaurant_id);
        self.fetch_page(query, count, page).await
    }

    async fn find_all(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>, StoreError> {
        let (mut query, mut count) = Self::select_orders();

        for builder in [&mut query, &mut count] {
            if let Some(status) = filter.status {
                builder.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(from) = filter.created_from {
                builder.push(" AND created_at >= ").push_bind(from);
            }
            if let Some(to) = filter.created_to {
                builder.push(" AND created_at <= ").push_bind(to);
            }
        }

        self.fetch_page(query, count, page).await
    }
}
