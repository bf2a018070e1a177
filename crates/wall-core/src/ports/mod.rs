//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod pubsub;
mod rate_limit;
mod repository;

pub use clock::{Clock, SystemClock};
pub use pubsub::{
    MessageHandler, PubSub, PubSubError, PubSubMessage, StatusHandler, SubscriptionId, handler,
};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, PostRepository};
