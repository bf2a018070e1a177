//! Terminal viewer for the ephemeral wall.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wall_client::{HttpWallApi, WallClient, WallSnapshot};
use wall_core::ports::{MessageHandler, PubSub, PubSubError, StatusHandler, SubscriptionId};

#[derive(Parser, Debug)]
#[command(name = "wall-client", about = "Watch and post to the ephemeral wall")]
struct Args {
    /// Base URL of the wall API
    #[arg(long, env = "WALL_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Redis URL carrying live wall events
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wall on every change (default)
    Watch,
    /// Pin a new note
    Post {
        message: String,
        /// Snap onto this grid slot instead of a random spot
        #[arg(long)]
        slot: Option<usize>,
        #[arg(long, default_value_t = 7)]
        columns: usize,
    },
    /// Bring a note to the front
    Raise { id: Uuid },
    /// Pin or unpin a note
    Pin { id: Uuid },
    Like { id: Uuid },
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api = Arc::new(HttpWallApi::new(&args.api_url));
    let pubsub = connect_pubsub(args.redis_url.as_deref()).await;
    let client = WallClient::connect(api, pubsub)
        .await
        .with_context(|| format!("Failed to load the wall from {}", args.api_url))?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&client).await?,
        Command::Post {
            message,
            slot,
            columns,
        } => {
            let post = match slot {
                Some(index) => client.submit_at_grid(&message, index, columns).await?,
                None => client.submit(&message).await?,
            };
            println!("Posted {}", post.id);
        }
        Command::Raise { id } => {
            client.raise(id).await?;
        }
        Command::Pin { id } => {
            let post = client.toggle_pin(id).await?;
            println!("{}", if post.is_pinned { "Pinned" } else { "Unpinned" });
        }
        Command::Like { id } => {
            let post = client.like(id).await?;
            println!("{} likes", post.likes);
        }
        Command::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}

/// Stand-in transport when no broadcast is reachable; the client then shows
/// the fetched wall as offline.
struct Offline;

#[async_trait]
impl PubSub for Offline {
    async fn publish(&self, _channel: &str, _message: &str) -> Result<(), PubSubError> {
        Err(PubSubError::Connection("no broadcast transport".into()))
    }

    async fn subscribe_with_status(
        &self,
        _channel: &str,
        _handler: MessageHandler,
        _on_status: StatusHandler,
    ) -> Result<SubscriptionId, PubSubError> {
        Err(PubSubError::Connection("no broadcast transport".into()))
    }

    async fn cancel(&self, _id: SubscriptionId) -> Result<(), PubSubError> {
        Ok(())
    }

    async fn unsubscribe(&self, _channel: &str) -> Result<(), PubSubError> {
        Ok(())
    }
}

#[cfg(feature = "redis")]
async fn connect_pubsub(redis_url: Option<&str>) -> Arc<dyn PubSub> {
    use wall_infra::{RedisConfig, RedisPubSub};

    let Some(url) = redis_url else {
        return Arc::new(Offline);
    };
    match RedisPubSub::new(RedisConfig::with_url(url)).await {
        Ok(pubsub) => Arc::new(pubsub),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unreachable, live updates disabled");
            Arc::new(Offline)
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_pubsub(redis_url: Option<&str>) -> Arc<dyn PubSub> {
    if redis_url.is_some() {
        tracing::warn!("Built without the redis feature, live updates disabled");
    }
    Arc::new(Offline)
}

async fn watch(client: &WallClient) -> anyhow::Result<()> {
    let mut changes = client.changes();
    render(&changes.borrow_and_update());

    loop {
        tokio::select! {
            changed = changes.changed() => {
                changed.context("Wall client stopped")?;
                render(&changes.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn render(snapshot: &WallSnapshot) {
    let status = if snapshot.connected { "live" } else { "offline" };
    println!("\n== ephemeral wall ({} notes, {status}) ==", snapshot.posts.len());

    let mut posts: Vec<_> = snapshot.posts.iter().collect();
    posts.sort_by_key(|p| std::cmp::Reverse(p.z_index));
    for post in posts {
        let minutes_left = (post.expires_at - chrono::Utc::now()).num_minutes().max(0);
        println!(
            "{} {} [{:>3} likes, {minutes_left}m left] {}",
            post.id,
            if post.is_pinned { "*" } else { " " },
            post.likes,
            post.message
        );
    }
}
