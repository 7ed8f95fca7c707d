use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use delivery_orders::api::{self, AppState};
use delivery_orders::config::ServerConfig;
use delivery_orders::domain::catalog::CatalogService;
use delivery_orders::domain::order::OrderService;
use delivery_orders::metrics::{self, Metrics};
use delivery_orders::store::{demo_catalog, seed_memory_store, MemoryStore, PgStore, Repositories};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,delivery_orders=debug")),
        )
        .init();

    let config = ServerConfig::parse();
    tracing::info!(http_bind = %config.http_bind, metrics_port = config.metrics_port, "Starting delivery order service");

    // === 1. Storage ===
    let repos = match config.database_url.as_deref().filter(|_| config.uses_database()) {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections)
                .await
                .context("connecting to Postgres")?;
            store.migrate().await.context("running migrations")?;

            if config.seed_demo_data {
                store
                    .seed_if_empty(&demo_catalog())
                    .await
                    .context("seeding demo data")?;
            }
            Repositories::from_store(Arc::new(store))
        }
        None => {
            tracing::warn!("No DATABASE_URL set, using the in-memory store with demo data");
            let store = MemoryStore::new();
            seed_memory_store(&store, &demo_catalog()).await;
            Repositories::from_store(Arc::new(store))
        }
    };

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new().context("creating metrics registry")?);
    tracing::info!(count = metrics.registry().gather().len(), "Metrics registry created");

    // === 3. Services ===
    let state = AppState {
        orders: OrderService::new(repos.clone(), metrics.clone())
            .with_order_number_attempts(config.order_number_attempts),
        catalog: CatalogService::new(repos.restaurants.clone(), repos.products.clone(), metrics.clone()),
    };

    // === 4. Servers ===
    let api_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(api::configure)
    })
    .bind(config.http_bind)
    .with_context(|| format!("binding {}", config.http_bind))?
    .run();

    tracing::info!(addr = %config.http_bind, "Order API listening");

    tokio::try_join!(
        async { api_server.await.context("order API server") },
        async {
            metrics::start_metrics_server(metrics.registry().clone(), config.metrics_port)
                .await
                .context("metrics server")
        },
    )?;

    tracing::info!("Shutdown complete");
    Ok(())
}
