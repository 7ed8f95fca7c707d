use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::guard::{AdminGuard, AuthorizationGuard, CustomerGuard, RestaurantGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
    Restaurant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
            Role::Restaurant => "RESTAURANT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" => Ok(Role::Customer),
            "RESTAURANT" => Ok(Role::Restaurant),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Who is calling, as resolved upstream from the authentication token.
///
/// For customer callers `user_id` is the customer id. Restaurant callers
/// carry the id of the single restaurant they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub role: Role,
    pub restaurant_id: Option<Uuid>,
}

impl CallerIdentity {
    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: Role::Admin, restaurant_id: None }
    }

    pub fn customer(customer_id: Uuid) -> Self {
        Self { user_id: customer_id, role: Role::Customer, restaurant_id: None }
    }

    pub fn restaurant(user_id: Uuid, restaurant_id: Uuid) -> Self {
        Self { user_id, role: Role::Restaurant, restaurant_id: Some(restaurant_id) }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The authorization policy for this caller's role.
    pub fn guard(&self) -> Box<dyn AuthorizationGuard> {
        match self.role {
            Role::Admin => Box::new(AdminGuard),
            Role::Customer => Box::new(CustomerGuard { customer_id: self.user_id }),
            Role::Restaurant => Box::new(RestaurantGuard { restaurant_id: self.restaurant_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_any_case() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Restaurant ".parse::<Role>().unwrap(), Role::Restaurant);
        assert!("courier".parse::<Role>().is_err());
    }

    #[test]
    fn test_constructors() {
        let restaurant_id = Uuid::new_v4();
        let caller = CallerIdentity::restaurant(Uuid::new_v4(), restaurant_id);
        assert_eq!(caller.role, Role::Restaurant);
        assert_eq!(caller.restaurant_id, Some(restaurant_id));
        assert!(!caller.is_admin());
        assert!(CallerIdentity::admin(Uuid::new_v4()).is_admin());
    }
}
