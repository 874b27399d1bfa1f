// Dashboard entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Open the response cache
// 4. Fetch every configured season and build the combined table
// 5. Initialize AppState
// 6. Build the router
// 7. Serve until Ctrl+C

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use hoopstats_core::cache::ResponseCache;
use hoopstats_core::config;
use hoopstats_core::fetch::{CachedFetcher, NbaStatsClient};
use hoopstats_core::pipeline::{Pipeline, PipelineError};
use hoopstats_web::router;
use hoopstats_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Hoopstats starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: seasons {}..{}, provider {}",
        config.seasons.start_year, config.seasons.end_year, config.provider.base_url
    );

    // 3. Open the response cache (failure degrades to uncached fetching)
    let cache = if config.cache.enabled {
        ResponseCache::open_or_disable(Path::new(&config.cache.dir))
    } else {
        info!("Response cache disabled by config");
        ResponseCache::Disabled
    };
    if let ResponseCache::Disk(disk) = &cache {
        match disk.purge_expired(config.cache.ttl()) {
            Ok(0) => {}
            Ok(n) => info!("Purged {n} expired cache entries"),
            Err(e) => warn!("Failed to purge expired cache entries: {e:#}"),
        }
    }

    // 4. Fetch every season and build the combined table
    let client = NbaStatsClient::from_config(&config.provider)
        .context("failed to build stats client")?;
    let fetcher = CachedFetcher::new(client, cache, config.cache.ttl());
    let pipeline = Pipeline::new(fetcher, config.provider.request_delay());

    let combined = match pipeline
        .build_combined_table(config.seasons.start_year, config.seasons.end_year)
        .await
    {
        Ok(combined) => combined,
        Err(e @ PipelineError::NoData { .. }) => {
            error!("{e}");
            eprintln!("Failed to fetch any NBA data. Check your connection and the provider settings in config/hoopstats.toml.");
            return Err(e.into());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("invalid season range")),
    };

    // 5. Initialize AppState
    let state = Arc::new(AppState::from_config(combined, &config.server));
    info!(
        "Serving {} rows across {} seasons",
        state.table().len(),
        state.seasons().len()
    );

    // 6. Build the router
    let app = router::create_router(state).layer(TraceLayer::new_for_http());

    // 7. Serve until Ctrl+C
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Dashboard listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Hoopstats shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
    }
    info!("Shutdown signal received");
}

/// Initialize tracing to stdout. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("hoopstats_core=info,hoopstats_web=info,tower_http=info,warn")
        }))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
