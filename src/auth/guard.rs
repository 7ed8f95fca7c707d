use uuid::Uuid;

use super::identity::CallerIdentity;
use crate::domain::catalog::Product;
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Ownership Authorization
// ============================================================================
//
// One guard per role, picked from the caller identity and evaluated
// explicitly by the services before they read or mutate anything. Every
// check answers with a plain bool; missing data means "no".
//
// ============================================================================

pub trait AuthorizationGuard: Send + Sync {
    fn can_access_order(&self, order: &Order) -> bool;

    /// Status changes and cancellation. Any party to the order may drive
    /// its status; the transition table decides which moves are legal.
    fn can_change_status(&self, order: &Order, _target: OrderStatus) -> bool {
        self.can_access_order(order)
    }

    fn can_manage_product(&self, product: &Product) -> bool;

    fn can_manage_restaurant(&self, restaurant_id: Uuid) -> bool;

    fn can_place_order_for(&self, customer_id: Uuid) -> bool;

    fn can_view_customer_orders(&self, customer_id: Uuid) -> bool;

    fn can_list_all_orders(&self) -> bool {
        false
    }
}

/// Administrators may act on everything.
pub struct AdminGuard;

impl AuthorizationGuard for AdminGuard {
    fn can_access_order(&self, _order: &Order) -> bool {
        true
    }

    fn can_manage_product(&self, _product: &Product) -> bool {
        true
    }

    fn can_manage_restaurant(&self, _restaurant_id: Uuid) -> bool {
        true
    }

    fn can_place_order_for(&self, _customer_id: Uuid) -> bool {
        true
    }

    fn can_view_customer_orders(&self, _customer_id: Uuid) -> bool {
        true
    }

    fn can_list_all_orders(&self) -> bool {
        true
    }
}

/// Customers see only their own orders and own no catalog entries.
pub struct CustomerGuard {
    pub customer_id: Uuid,
}

impl AuthorizationGuard for CustomerGuard {
    fn can_access_order(&self, order: &Order) -> bool {
        order.customer_id == self.customer_id
    }

    fn can_manage_product(&self, _product: &Product) -> bool {
        false
    }

    fn can_manage_restaurant(&self, _restaurant_id: Uuid) -> bool {
        false
    }

    fn can_place_order_for(&self, customer_id: Uuid) -> bool {
        customer_id == self.customer_id
    }

    fn can_view_customer_orders(&self, customer_id: Uuid) -> bool {
        customer_id == self.customer_id
    }
}

/// Restaurant users act only within the restaurant they are linked to.
pub struct RestaurantGuard {
    pub restaurant_id: Option<Uuid>,
}

impl AuthorizationGuard for RestaurantGuard {
    fn can_access_order(&self, order: &Order) -> bool {
        is_restaurant_owner(self.restaurant_id, order.restaurant_id)
    }

    fn can_manage_product(&self, product: &Product) -> bool {
        is_product_owner(self.restaurant_id, product)
    }

    fn can_manage_restaurant(&self, restaurant_id: Uuid) -> bool {
        is_restaurant_owner(self.restaurant_id, restaurant_id)
    }

    fn can_place_order_for(&self, _customer_id: Uuid) -> bool {
        false
    }

    fn can_view_customer_orders(&self, _customer_id: Uuid) -> bool {
        false
    }
}

/// Whether the caller may read or act on `order`. Unknown caller or
/// unknown order is a denial.
pub fn can_access_order(caller: Option<&CallerIdentity>, order: Option<&Order>) -> bool {
    match (caller, order) {
        (Some(caller), Some(order)) => caller.guard().can_access_order(order),
        _ => false,
    }
}

pub fn is_product_owner(caller_restaurant_id: Option<Uuid>, product: &Product) -> bool {
    caller_restaurant_id == Some(product.restaurant_id)
}

pub fn is_restaurant_owner(caller_restaurant_id: Option<Uuid>, restaurant_id: Uuid) -> bool {
    caller_restaurant_id == Some(restaurant_id)
}
