//! Application Startup
//!
//! Wires the pool, the event bus and the router together, then serves
//! until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::middleware::from_fn;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Settings;
use crate::infrastructure::events::{self, EventHub};
use crate::infrastructure::media::MediaStore;
use crate::infrastructure::{database, metrics};
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::metrics::track_metrics;
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

/// Shared handler state, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub hub: Arc<EventHub>,
    pub media: MediaStore,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub settings: Arc<Settings>,
}

/// A fully built server, bound but not yet serving
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Construct every subsystem from settings and bind the listener
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        // Create database pool and bring the schema up to date
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");
        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        // One managed Redis connection for publishing and health checks,
        // one plain client for the pub/sub relay
        let redis = events::create_connection_manager(&settings.redis).await?;
        let relay_client = events::create_client(&settings.redis)?;

        // Event hub fed by the relay task
        let hub = Arc::new(EventHub::new());
        tokio::spawn(events::run_relay_forever(relay_client, hub.clone()));

        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            settings.snowflake.node_id as u64,
        ));

        // Image storage
        let media = MediaStore::new(&settings.media.root);

        let state = AppState {
            db,
            redis,
            hub,
            media,
            snowflake,
            settings: Arc::new(settings.clone()),
        };

        // Refresh the pool gauges every ten seconds
        let pool = state.db.clone();
        let max_connections = settings.database.max_connections;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(10));
            loop {
                tick.tick().await;
                let idle = pool.num_idle() as u32;
                let active = pool.size().saturating_sub(idle);
                metrics::update_db_pool_stats(idle, active, max_connections);
            }
        });

        // Outer layers run last on the way in, first on the way out
        let router = routes::create_router(state)
            .layer(from_fn(track_metrics))
            .layer(logging::create_trace_layer())
            .layer(CompressionLayer::new())
            .layer(cors::create_cors_layer(&settings.cors));

        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Serve until ctrl-c or SIGTERM, then drain
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Address the listener actually bound, useful with port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Resolve when the process receives ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
