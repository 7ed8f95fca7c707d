use uuid::Uuid;

use crate::error::ErrorKind;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(Uuid),

    #[error("Access denied")]
    AccessDenied,

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ProductNotFound(_) | CatalogError::RestaurantNotFound(_) => {
                ErrorKind::NotFound
            }
            CatalogError::AccessDenied => ErrorKind::AccessDenied,
            CatalogError::Storage(_) => ErrorKind::Unexpected,
        }
    }
}
