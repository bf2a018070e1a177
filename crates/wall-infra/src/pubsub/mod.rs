//! Pub/Sub implementations carrying wall broadcasts.

mod memory;

pub use memory::InMemoryPubSub;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisPubSub, connect_or_fallback};
