// ============================================================================
// Catalog Domain - Customers, restaurants and products
// ============================================================================

pub mod entities;
pub mod errors;
pub mod command_handler;

pub use entities::*;
pub use errors::*;
pub use command_handler::*;
