use anyhow::Context;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotel_reservations::{
    app,
    cache::CacheService,
    config::Config,
    database::Database,
    redis_client::RedisClient,
    services::{Clock, ConsoleNotifier, Notifier, SmtpNotifier, SystemClock},
    store::{MemoryStore, PgStore, ReservationStore},
    AppState,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::new(&config.app.rust_log);
    if config.app.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Hotel Paradise reservation service");
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Postgres when configured, otherwise the in-memory demo catalog
    let store: Arc<dyn ReservationStore> = match &config.database.url {
        Some(url) => {
            let db = Database::connect(url, &config.database)
                .await
                .context("failed to connect to database")?;
            db.run_migrations().await.context("failed to run migrations")?;
            info!("Database connected");
            Arc::new(PgStore::new(db.pool))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory demo catalog");
            Arc::new(MemoryStore::with_demo_catalog(clock.today())?)
        }
    };

    // Redis is optional; a failed connection only disables catalog caching
    let redis = match &config.redis.url {
        Some(url) => match RedisClient::connect(url).await {
            Ok(client) => {
                info!("Redis connected");
                Some(client)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, catalog caching disabled");
                None
            }
        },
        None => None,
    };
    let cache = CacheService::new(redis, store.clone(), config.redis.cache_ttl_seconds);
    cache.warmup().await;

    let notifier: Arc<dyn Notifier> = match &config.mail.smtp_host {
        Some(host) => Arc::new(SmtpNotifier::new(host, &config.mail)?),
        None => {
            info!("SMTP_HOST not set, confirmations will be logged only");
            Arc::new(ConsoleNotifier)
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;
    let state = AppState::new(config, store, cache, clock, notifier);
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
