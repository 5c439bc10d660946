use medguard::AppResources;
use medguard::api::start_webserver;
use medguard::config::load_config_or_panic;
use medguard::rate_limit::RateLimitStore;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "medguard=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    initialize_tracing();

    let config = Arc::new(load_config_or_panic());

    let db = Arc::new(Database::connect(&config.database_url).await?);

    // Expired rate limit windows are dropped in the background
    let store = RateLimitStore::default();
    store.spawn_sweeper(config.rate_limits.sweep_interval());

    let resources = AppResources::new(db, config, &store);
    tracing::info!(
        sms_configured = resources.dispatcher.is_configured(),
        default_country = ?resources.dispatcher.normalizer().default_country(),
        dispatch_concurrency = resources.config.alerts.dispatch_concurrency,
        "alert configuration"
    );

    start_webserver(resources).await
}
