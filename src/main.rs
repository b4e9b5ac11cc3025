//! Forum pipeline service
//!
//! Runs the queue workers, the retention sweeper, the realtime relay and the
//! inbound webhook endpoint in one process.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forum_pipeline::adapters::cache::RedisCache;
use forum_pipeline::adapters::http::{webhook_router, WebhookAppState};
use forum_pipeline::adapters::postgres::{
    PostgresContentRepository, PostgresDeliveryLog, PostgresNotificationRepository,
    PostgresReviewTicketRepository, PostgresThreadRepository, PostgresUserDirectory,
    PostgresWebhookSubscriptionRepository,
};
use forum_pipeline::adapters::queue::RedisJobQueue;
use forum_pipeline::adapters::realtime::{RedisRealtimePublisher, RedisRealtimeRelay, TopicRooms};
use forum_pipeline::adapters::scoring::{KeywordScorer, OpenAiScorer, OpenAiScorerConfig};
use forum_pipeline::adapters::webhook::ReqwestWebhookClient;
use forum_pipeline::application::{IngestEmailStatusHandler, Pipeline, PipelineDeps};
use forum_pipeline::config::AppConfig;
use forum_pipeline::domain::webhook::WebhookSigner;
use forum_pipeline::ports::{ContentScorer, DeliveryLogRepository, JobQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    info!(environment = ?config.server.environment, "Starting forum pipeline");

    // Database
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    // Redis
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = tokio::time::timeout(
        config.redis.connect_timeout(),
        redis_client.get_multiplexed_tokio_connection(),
    )
    .await??;

    let queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::new(redis_conn.clone()).with_key_prefix(config.redis.queue_prefix.clone()),
    );
    let audit: Arc<dyn DeliveryLogRepository> = Arc::new(PostgresDeliveryLog::new(pool.clone()));

    let scorer: Arc<dyn ContentScorer> = match &config.ai.openai_api_key {
        Some(key) if config.ai.has_openai() => {
            let scorer_config = OpenAiScorerConfig::new(key.clone())
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout())
                .with_fallback(config.ai.keyword_fallback);
            info!(model = %scorer_config.model, "Scoring with OpenAI");
            Arc::new(OpenAiScorer::new(scorer_config)?)
        }
        _ => {
            warn!("No OpenAI key configured, scoring with keyword detection only");
            Arc::new(KeywordScorer::new())
        }
    };

    let deps = PipelineDeps {
        queue: queue.clone(),
        cache: Arc::new(RedisCache::new(redis_conn.clone())),
        realtime: Arc::new(RedisRealtimePublisher::new(redis_conn)),
        scorer,
        contents: Arc::new(PostgresContentRepository::new(pool.clone())),
        threads: Arc::new(PostgresThreadRepository::new(pool.clone())),
        users: Arc::new(PostgresUserDirectory::new(pool.clone())),
        tickets: Arc::new(PostgresReviewTicketRepository::new(pool.clone())),
        notifications: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresWebhookSubscriptionRepository::new(pool.clone())),
        audit: audit.clone(),
        webhook_client: Arc::new(ReqwestWebhookClient::new()?),
    };

    let pipeline = Pipeline::start(deps, config.pipeline_settings()).await?;

    // Relay pub/sub into local rooms for subscribers attached to this process
    let relay = RedisRealtimeRelay::new(redis_client, Arc::new(TopicRooms::with_default_capacity()));
    let relay_shutdown = pipeline.shutdown_signal();
    tokio::spawn(async move {
        if let Err(e) = relay.run(relay_shutdown).await {
            error!(error = %e, "Realtime relay stopped");
        }
    });

    // Inbound webhooks
    let ingest = IngestEmailStatusHandler::new(
        WebhookSigner::new(config.webhook.inbound_secret.clone()),
        audit.clone(),
        queue,
    )
    .with_max_age(config.webhook.max_timestamp_age());
    let app = webhook_router(
        WebhookAppState {
            ingest: Arc::new(ingest),
            audit,
        },
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining workers");
    pipeline.shutdown().await;
    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_filter.clone()));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
