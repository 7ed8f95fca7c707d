// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - catalog: customers, restaurants and products, plus owner-only toggles
// - order:   pricing, the status lifecycle and the order service
//
// Persistence is reached only through the traits in `crate::store`.
//
// ============================================================================

pub mod catalog;
pub mod order;
