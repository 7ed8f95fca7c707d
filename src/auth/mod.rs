// ============================================================================
// Caller identity and ownership-based authorization
// ============================================================================

mod guard;
mod identity;

pub use guard::{
    can_access_order, is_product_owner, is_restaurant_owner, AdminGuard, AuthorizationGuard,
    CustomerGuard, RestaurantGuard,
};
pub use identity::{CallerIdentity, Role, UnknownRole};
