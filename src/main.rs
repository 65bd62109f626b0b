use std::sync::Arc;

use campusride::config::Config;
use campusride::db::PgStore;
use campusride::engine::Engine;
use campusride::error::Error;
use campusride::external::{LogNotifier, Notifier, WebhookNotifier};
use campusride::server::serve;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusride=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = PgStore::new(&config.database_url, config.database_max_connections).await?;

    let notifier: Arc<dyn Notifier> = match &config.notification_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.as_str())),
        None => Arc::new(LogNotifier),
    };

    let engine = Engine::new(Arc::new(store), notifier, config.engine.clone())?;

    serve(engine, config.listen_addr).await
}
