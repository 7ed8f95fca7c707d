use clap::Parser;
use std::net::SocketAddr;

use crate::domain::order::DEFAULT_ORDER_NUMBER_ATTEMPTS;

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
const DEFAULT_METRICS_PORT: u16 = 9090;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Parser)]
#[command(name = "delivery-orders", about = "Food-delivery order service", version)]
pub struct ServerConfig {
    #[arg(
        long,
        env = "DELIVERY_HTTP_BIND",
        value_name = "ADDR",
        default_value = DEFAULT_HTTP_BIND,
        help = "Address the order API listens on"
    )]
    pub http_bind: SocketAddr,

    #[arg(
        long,
        env = "DELIVERY_METRICS_PORT",
        value_name = "PORT",
        default_value_t = DEFAULT_METRICS_PORT,
        help = "Port serving /metrics and /health"
    )]
    pub metrics_port: u16,

    #[arg(
        long,
        env = "DATABASE_URL",
        value_name = "URL",
        help = "Postgres connection string; the in-memory store is used when absent"
    )]
    pub database_url: Option<String>,

    #[arg(
        long,
        env = "DELIVERY_DB_MAX_CONNECTIONS",
        value_name = "N",
        default_value_t = DEFAULT_DB_MAX_CONNECTIONS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub db_max_connections: u32,

    #[arg(
        long,
        env = "DELIVERY_ORDER_NUMBER_ATTEMPTS",
        value_name = "N",
        default_value_t = DEFAULT_ORDER_NUMBER_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Attempts at drawing an unused order number"
    )]
    pub order_number_attempts: u32,

    #[arg(
        long,
        env = "DELIVERY_SEED_DEMO_DATA",
        help = "Write the demo catalog into an empty database"
    )]
    pub seed_demo_data: bool,
}

impl ServerConfig {
    pub fn uses_database(&self) -> bool {
        self.database_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["delivery-orders"]).unwrap();
        assert_eq!(config.http_bind, DEFAULT_HTTP_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.order_number_attempts, DEFAULT_ORDER_NUMBER_ATTEMPTS);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "delivery-orders",
            "--http-bind",
            "0.0.0.0:3000",
            "--database-url",
            "postgres://localhost/delivery",
            "--order-number-attempts",
            "2",
            "--seed-demo-data",
        ])
        .unwrap();

        assert_eq!(config.http_bind.port(), 3000);
        assert!(config.uses_database());
        assert_eq!(config.order_number_attempts, 2);
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let result = ServerConfig::try_parse_from(["delivery-orders", "--order-number-attempts", "0"]);
        assert!(result.is_err());
    }
}
