//! # Wall Infrastructure
//!
//! Concrete implementations of the ports defined in `wall-core`.
//! This crate contains the post stores, the broadcast transports, and the
//! request rate limiter.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL post store via SeaORM
//! - `rate-limit` - Rate limiting via governor
//! - `redis` - Redis pub/sub for cross-process broadcast

pub mod database;
pub mod pubsub;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use database::InMemoryPostRepository;
pub use pubsub::InMemoryPubSub;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnections, PostgresPostRepository};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use pubsub::{RedisConfig, RedisPubSub, connect_or_fallback};
