//! Application state - shared across all handlers.

use std::sync::Arc;

use wall_core::PostService;
use wall_core::ports::{PostRepository, PubSub};
use wall_infra::{InMemoryPostRepository, InMemoryPubSub};

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use wall_infra::{DatabaseConnections, PostgresPostRepository};

#[cfg(feature = "rate-limit")]
use wall_core::ports::RateLimiter;
#[cfg(feature = "rate-limit")]
use wall_infra::InMemoryRateLimiter;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub pubsub: Arc<dyn PubSub>,
    #[cfg(feature = "rate-limit")]
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> std::io::Result<Self> {
        #[cfg(feature = "postgres")]
        let repo = Self::init_store(config).await;
        #[cfg(not(feature = "postgres"))]
        let repo: Arc<dyn PostRepository> = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL set but postgres feature disabled - using in-memory store");
            }
            Arc::new(InMemoryPostRepository::new())
        };

        let pubsub = Self::init_pubsub(config).await?;

        tracing::info!("Application state initialized");

        Ok(Self {
            posts: PostService::new(repo, pubsub.clone()),
            pubsub,
            #[cfg(feature = "rate-limit")]
            rate_limiter: Arc::new(InMemoryRateLimiter::from_env()),
        })
    }

    /// State backed entirely by in-process implementations.
    pub fn in_memory() -> Self {
        let repo: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
        let pubsub: Arc<dyn PubSub> = Arc::new(InMemoryPubSub::default());

        Self {
            posts: PostService::new(repo, pubsub.clone()),
            pubsub,
            #[cfg(feature = "rate-limit")]
            rate_limiter: Arc::new(InMemoryRateLimiter::new(Default::default())),
        }
    }

    #[cfg(feature = "postgres")]
    async fn init_store(config: &AppConfig) -> Arc<dyn PostRepository> {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryPostRepository::new());
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => Arc::new(PostgresPostRepository::new(connections.main)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryPostRepository::new())
            }
        }
    }

    async fn init_pubsub(config: &AppConfig) -> std::io::Result<Arc<dyn PubSub>> {
        #[cfg(feature = "redis")]
        if let Some(redis_config) = config.redis.clone() {
            return wall_infra::connect_or_fallback(redis_config)
                .await
                .map_err(std::io::Error::other);
        }

        #[cfg(not(feature = "redis"))]
        let _ = config;

        Ok(Arc::new(InMemoryPubSub::default()))
    }
}
