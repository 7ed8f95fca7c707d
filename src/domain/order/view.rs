use serde::Serialize;

use super::aggregate::Order;
use crate::domain::catalog::{CustomerSummary, RestaurantSummary};

/// An order together with the customer and restaurant it references, as
/// returned to callers. A summary is `None` when its row no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<CustomerSummary>,
    pub restaurant: Option<RestaurantSummary>,
}

impl OrderView {
    pub fn new(
        order: Order,
        customer: Option<CustomerSummary>,
        restaurant: Option<RestaurantSummary>,
    ) -> Self {
        Self {
            order,
            customer,
            restaurant,
        }
    }
}
