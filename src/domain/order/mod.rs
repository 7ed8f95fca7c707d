// ============================================================================
// Order Domain - Creation and lifecycle of orders
// ============================================================================
//
// - Value objects (OrderLineItem, OrderStatus, OrderNumber)
// - Events (OrderPlaced, OrderStatusChanged, OrderCancelled)
// - Commands (PlaceOrder, OrderCommand)
// - Errors (OrderError)
// - Aggregate (Order with the transition rules)
// - Pricing (PricingCalculator)
// - Lifecycle (OrderLifecycle, persists transitions)
// - Command Handler (OrderService, the entry point)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod pricing;
pub mod lifecycle;
pub mod view;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use pricing::*;
pub use lifecycle::*;
pub use view::*;
pub use command_handler::*;
