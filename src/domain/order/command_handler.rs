use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::PlaceOrder;
use super::errors::OrderError;
use super::lifecycle::OrderLifecycle;
use super::pricing::PricingCalculator;
use super::value_objects::{OrderLineItem, OrderNumber, OrderStatus};
use super::view::OrderView;
use crate::auth::{self, AuthorizationGuard, CallerIdentity};
use crate::domain::catalog::{Customer, CustomerSummary, Restaurant, RestaurantSummary};
use crate::metrics::Metrics;
use crate::store::{OrderFilter, Page, PageRequest, Repositories};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Order Service
// ============================================================================
//
// Entry point for every order operation. Each call takes the caller
// identity explicitly, checks it with the caller's guard before reading or
// mutating an order, and hands status changes to the lifecycle manager.
//
// Creation sequence:
//   authorize → customer → restaurant → price → number + insert (retried
//   on number collision) → view
//
// Nothing is written until the final insert, so a failure at any earlier
// step leaves no trace.
//
// ============================================================================

pub const DEFAULT_ORDER_NUMBER_ATTEMPTS: u32 = 5;

type NumberGenerator = Arc<dyn Fn() -> OrderNumber + Send + Sync>;

#[derive(Clone)]
pub struct OrderService {
    repos: Repositories,
    pricing: PricingCalculator,
    lifecycle: OrderLifecycle,
    metrics: Arc<Metrics>,
    order_number_attempts: u32,
    next_number: NumberGenerator,
}

impl OrderService {
    pub fn new(repos: Repositories, metrics: Arc<Metrics>) -> Self {
        Self {
            pricing: PricingCalculator::new(repos.products.clone()),
            lifecycle: OrderLifecycle::new(repos.orders.clone(), metrics.clone()),
            repos,
            metrics,
            order_number_attempts: DEFAULT_ORDER_NUMBER_ATTEMPTS,
            next_number: Arc::new(OrderNumber::generate),
        }
    }

    pub fn with_order_number_attempts(mut self, attempts: u32) -> Self {
        self.order_number_attempts = attempts.max(1);
        self
    }

    pub fn with_number_generator(
        mut self,
        generator: impl Fn() -> OrderNumber + Send + Sync + 'static,
    ) -> Self {
        self.next_number = Arc::new(generator);
        self
    }

    // ========================================================================
    // Commands
    // ========================================================================

    #[tracing::instrument(
        skip(self, caller, request),
        fields(caller = %caller.user_id, customer_id = %request.customer_id, restaurant_id = %request.restaurant_id)
    )]
    pub async fn create_order(
        &self,
        caller: &CallerIdentity,
        request: PlaceOrder,
    ) -> Result<OrderView, OrderError> {
        let started = Instant::now();
        let result = self.place(caller, request).await;

        if let Ok(view) = &result {
            self.metrics
                .record_order_created(started.elapsed().as_secs_f64());
            tracing::info!(
                order_id = %view.order.id,
                order_number = %view.order.order_number,
                total = %view.order.total_amount,
                "Order placed"
            );
        }

        self.observe("create_order", result)
    }

    async fn place(&self, caller: &CallerIdentity, request: PlaceOrder) -> Result<OrderView, OrderError> {
        if !caller.guard().can_place_order_for(request.customer_id) {
            return Err(OrderError::AccessDenied);
        }

        let customer = self.active_customer(request.customer_id).await?;
        let restaurant = self.open_restaurant(request.restaurant_id).await?;

        let total = self
            .pricing
            .compute_total(&request.items, restaurant.id, restaurant.delivery_fee)
            .await?;

        let config = RetryConfig::immediate(self.order_number_attempts);
        let order = retry_on_transient(config, |attempt| {
            if attempt > 1 {
                self.metrics.record_order_number_retry();
            }
            let (order, placed) = Order::place(request.clone(), (self.next_number)(), total);
            let orders = self.repos.orders.clone();
            async move {
                orders
                    .insert_order(&order, &[placed])
                    .await
                    .map_err(OrderError::from)
            }
        })
        .await
        .into_result()?;

        Ok(OrderView::new(
            order,
            Some(CustomerSummary::from(&customer)),
            Some(RestaurantSummary::from(&restaurant)),
        ))
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn set_status(
        &self,
        caller: &CallerIdentity,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderView, OrderError> {
        let result = async {
            let order = self
                .load_authorized(caller, order_id, |guard, order| guard.can_change_status(order, status))
                .await?;
            let order = self.lifecycle.transition(order, status).await?;
            self.view_of(order).await
        }
        .await;

        self.observe("set_status", result)
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn cancel(
        &self,
        caller: &CallerIdentity,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Order, OrderError> {
        let result = async {
            let order = self
                .load_authorized(caller, order_id, |guard, order| {
                    guard.can_change_status(order, OrderStatus::Cancelled)
                })
                .await?;
            self.lifecycle
                .cancel(order, reason, Some(caller.user_id))
                .await
        }
        .await;

        self.observe("cancel", result)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn get_order(&self, caller: &CallerIdentity, order_id: Uuid) -> Result<OrderView, OrderError> {
        let result = async {
            let order = self
                .load_authorized(caller, order_id, |guard, order| guard.can_access_order(order))
                .await?;
            self.view_of(order).await
        }
        .await;

        self.observe("get_order", result)
    }

    /// Price `items` against the restaurant's current menu without placing
    /// anything.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn simulate_total(
        &self,
        items: &[OrderLineItem],
        restaurant_id: Uuid,
    ) -> Result<Decimal, OrderError> {
        let result = async {
            let restaurant = self
                .repos
                .restaurants
                .find_restaurant(restaurant_id)
                .await?
                .ok_or(OrderError::RestaurantNotFound(restaurant_id))?;

            self.pricing
                .compute_total(items, restaurant.id, restaurant.delivery_fee)
                .await
        }
        .await;

        self.observe("simulate_total", result)
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn list_for_customer(
        &self,
        caller: &CallerIdentity,
        customer_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<OrderView>, OrderError> {
        let result = async {
            if !caller.guard().can_view_customer_orders(customer_id) {
                return Err(OrderError::AccessDenied);
            }
            if !self.repos.customers.exists_customer(customer_id).await? {
                return Err(OrderError::CustomerNotFound(customer_id));
            }

            let orders = self.repos.orders.find_by_customer(customer_id, page).await?;
            self.views_of(orders).await
        }
        .await;

        self.observe("list_for_customer", result)
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn list_for_restaurant(
        &self,
        caller: &CallerIdentity,
        restaurant_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<OrderView>, OrderError> {
        let result = async {
            if !caller.guard().can_manage_restaurant(restaurant_id) {
                return Err(OrderError::AccessDenied);
            }
            if !self.repos.restaurants.exists_restaurant(restaurant_id).await? {
                return Err(OrderError::RestaurantNotFound(restaurant_id));
            }

            let orders = self.repos.orders.find_by_restaurant(restaurant_id, page).await?;
            self.views_of(orders).await
        }
        .await;

        self.observe("list_for_restaurant", result)
    }

    #[tracing::instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn list_all(
        &self,
        caller: &CallerIdentity,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<OrderView>, OrderError> {
        let result = async {
            if !caller.guard().can_list_all_orders() {
                return Err(OrderError::AccessDenied);
            }

            let orders = self.repos.orders.find_all(&filter, page).await?;
            self.views_of(orders).await
        }
        .await;

        self.observe("list_all", result)
    }

    /// Whether `caller` may act on the order. Lookup failures deny.
    pub async fn can_access_order(&self, caller: &CallerIdentity, order_id: Uuid) -> bool {
        match self.repos.orders.find_order(order_id).await {
            Ok(order) => auth::can_access_order(Some(caller), order.as_ref()),
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "Order lookup failed during access check");
                false
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn active_customer(&self, customer_id: Uuid) -> Result<Customer, OrderError> {
        let customer = self
            .repos
            .customers
            .find_customer(customer_id)
            .await?
            .ok_or(OrderError::CustomerNotFound(customer_id))?;

        if !customer.active {
            return Err(OrderError::CustomerInactive(customer_id));
        }
        Ok(customer)
    }

    async fn open_restaurant(&self, restaurant_id: Uuid) -> Result<Restaurant, OrderError> {
        let restaurant = self
            .repos
            .restaurants
            .find_restaurant(restaurant_id)
            .await?
            .ok_or(OrderError::RestaurantNotFound(restaurant_id))?;

        if !restaurant.active {
            return Err(OrderError::RestaurantClosed(restaurant_id));
        }
        Ok(restaurant)
    }

    /// Load an order the caller is allowed to act on. Only admins learn that
    /// an order does not exist; everyone else gets a denial.
    async fn load_authorized(
        &self,
        caller: &CallerIdentity,
        order_id: Uuid,
        allowed: impl Fn(&dyn AuthorizationGuard, &Order) -> bool,
    ) -> Result<Order, OrderError> {
        let order = self.repos.orders.find_order(order_id).await?;

        match order {
            Some(order) if allowed(caller.guard().as_ref(), &order) => Ok(order),
            Some(_) => Err(OrderError::AccessDenied),
            None if caller.is_admin() => Err(OrderError::OrderNotFound(order_id)),
            None => Err(OrderError::AccessDenied),
        }
    }

    async fn view_of(&self, order: Order) -> Result<OrderView, OrderError> {
        let customer = self.repos.customers.find_customer(order.customer_id).await?;
        let restaurant = self
            .repos
            .restaurants
            .find_restaurant(order.restaurant_id)
            .await?;

        Ok(OrderView::new(
            order,
            customer.as_ref().map(CustomerSummary::from),
            restaurant.as_ref().map(RestaurantSummary::from),
        ))
    }

    async fn views_of(&self, page: Page<Order>) -> Result<Page<OrderView>, OrderError> {
        let Page { items, page, size, total } = page;

        let mut views = Vec::with_capacity(items.len());
        for order in items {
            views.push(self.view_of(order).await?);
        }

        Ok(Page { items: views, page, size, total })
    }

    fn observe<T>(&self, operation: &str, result: Result<T, OrderError>) -> Result<T, OrderError> {
        if let Err(e) = &result {
            let kind = e.kind();
            self.metrics.record_failure(operation, kind);

            match e {
                OrderError::Storage(_) => {
                    tracing::error!(operation, error = %e, "Order operation failed")
                }
                _ => tracing::debug!(operation, kind = %kind, error = %e, "Order operation rejected"),
            }
        }
        result
    }
}
