//! Live wall view with a single task owning the local state.
//!
//! Remote events, prune ticks and connection changes are funneled into one
//! dispatcher through an mpsc channel. Readers observe the result through a
//! `watch` channel of [`WallSnapshot`]s.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use wall_core::domain::{MAX_MESSAGE_CHARS, Position, Post, PostPatch, WALL_CHANNEL, WallEvent};
use wall_core::ports::{Clock, PubSub, SubscriptionId, SystemClock, handler};
use wall_shared::dto::{CreatePostRequest, PositionDto};

use crate::api::WallApi;
use crate::error::ClientError;
use crate::placement::{self, NoteStyle};
use crate::state::WallState;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

enum WallCommand {
    Event(WallEvent),
    Prune,
    Connection(bool),
    NextZIndex(oneshot::Sender<i32>),
    Lookup(Uuid, oneshot::Sender<Option<Post>>),
}

/// Read-only view of the wall after the latest change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallSnapshot {
    pub posts: Vec<Post>,
    pub connected: bool,
    pub highest_z_index: i32,
}

impl From<&WallState> for WallSnapshot {
    fn from(state: &WallState) -> Self {
        Self {
            posts: state.posts().to_vec(),
            connected: state.is_connected(),
            highest_z_index: state.highest_z_index(),
        }
    }
}

#[derive(Clone)]
pub struct ClientOptions {
    pub prune_interval: Duration,
    pub clock: Arc<dyn Clock>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            prune_interval: PRUNE_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }
}

pub struct WallClient {
    api: Arc<dyn WallApi>,
    commands: mpsc::UnboundedSender<WallCommand>,
    snapshot: watch::Receiver<WallSnapshot>,
    tasks: Vec<JoinHandle<()>>,
    pubsub: Arc<dyn PubSub>,
    subscription: Option<SubscriptionId>,
}

impl WallClient {
    pub async fn connect(
        api: Arc<dyn WallApi>,
        pubsub: Arc<dyn PubSub>,
    ) -> Result<Self, ClientError> {
        Self::connect_with(api, pubsub, ClientOptions::default()).await
    }

    /// Subscribe to the wall channel, load the current posts and start the
    /// dispatcher and prune timer.
    ///
    /// The subscription is opened before the fetch so nothing published in
    /// between is missed; overlap is absorbed by `new-post` de-duplication.
    pub async fn connect_with(
        api: Arc<dyn WallApi>,
        pubsub: Arc<dyn PubSub>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let (commands, inbox) = mpsc::unbounded_channel();

        let forward = commands.clone();
        let status = commands.clone();
        let subscription = pubsub
            .subscribe_with_status(
                WALL_CHANNEL,
                handler(move |msg| {
                    let forward = forward.clone();
                    async move {
                        match WallEvent::from_payload(&msg.payload) {
                            Ok(event) => {
                                let _ = forward.send(WallCommand::Event(event));
                            }
                            Err(e) => {
                                tracing::warn!(channel = %msg.channel, error = %e, "Dropping malformed wall event")
                            }
                        }
                    }
                }),
                Box::new(move |up: bool| {
                    let _ = status.send(WallCommand::Connection(up));
                }),
            )
            .await;

        let subscription = match subscription {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Live updates unavailable");
                None
            }
        };
        let connected = subscription.is_some();

        let posts = match api.list().await {
            Ok(posts) => posts,
            Err(e) => {
                if let Some(id) = subscription {
                    let _ = pubsub.cancel(id).await;
                }
                return Err(e);
            }
        };
        let mut state = WallState::from_posts(posts);
        state.set_connected(connected);
        tracing::info!(posts = state.posts().len(), connected, "Wall loaded");

        let (publisher, snapshot) = watch::channel(WallSnapshot::from(&state));

        let dispatcher = tokio::spawn(dispatch(state, inbox, publisher, options.clock));
        let ticker = tokio::spawn(prune_ticks(commands.clone(), options.prune_interval));

        Ok(Self {
            api,
            commands,
            snapshot,
            tasks: vec![dispatcher, ticker],
            pubsub,
            subscription,
        })
    }

    pub fn posts(&self) -> Vec<Post> {
        self.snapshot.borrow().posts.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().connected
    }

    pub fn snapshot(&self) -> WallSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn changes(&self) -> watch::Receiver<WallSnapshot> {
        self.snapshot.clone()
    }

    /// Pin a new note at a random spot with random colors.
    pub async fn submit(&self, message: &str) -> Result<Post, ClientError> {
        let style = placement::random_style(&mut rand::thread_rng());
        self.create(message, style).await
    }

    /// Pin a new note on grid slot `index`; colors and tilt stay random.
    pub async fn submit_at_grid(
        &self,
        message: &str,
        index: usize,
        columns: usize,
    ) -> Result<Post, ClientError> {
        let mut style = placement::random_style(&mut rand::thread_rng());
        style.position = placement::grid_position(index, columns);
        self.create(message, style).await
    }

    /// Bring a note to the front.
    pub async fn raise(&self, id: Uuid) -> Result<Post, ClientError> {
        self.lookup(id).await?;
        let z_index = self.next_z_index().await?;
        self.patch(id, PostPatch::z_index(z_index)).await
    }

    pub async fn toggle_pin(&self, id: Uuid) -> Result<Post, ClientError> {
        let post = self.lookup(id).await?;
        self.patch(id, PostPatch::pinned(!post.is_pinned)).await
    }

    pub async fn like(&self, id: Uuid) -> Result<Post, ClientError> {
        let post = self.lookup(id).await?;
        self.patch(id, PostPatch::likes(post.likes.saturating_add(1)))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.api.delete(id).await.inspect_err(|e| {
            tracing::warn!(post_id = %id, error = %e, "Failed to delete post");
        })
    }

    async fn create(&self, message: &str, style: NoteStyle) -> Result<Post, ClientError> {
        let message: String = message.trim().chars().take(MAX_MESSAGE_CHARS).collect();
        if message.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let z_index = self.next_z_index().await?;
        let Position { top, left } = style.position;
        let request = CreatePostRequest {
            message,
            position: Some(PositionDto { top, left }),
            color: style.color.to_string(),
            pin_color: style.pin_color.to_string(),
            rotation: Some(style.rotation),
            z_index: Some(z_index),
        };

        self.api.create(request).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to create post");
        })
    }

    async fn patch(&self, id: Uuid, patch: PostPatch) -> Result<Post, ClientError> {
        self.api.update(id, patch).await.inspect_err(|e| {
            tracing::warn!(post_id = %id, error = %e, "Failed to update post");
        })
    }

    async fn next_z_index(&self) -> Result<i32, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(WallCommand::NextZIndex(reply))?;
        rx.await.map_err(|_| ClientError::Closed)
    }

    async fn lookup(&self, id: Uuid) -> Result<Post, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(WallCommand::Lookup(id, reply))?;
        rx.await
            .map_err(|_| ClientError::Closed)?
            .ok_or(ClientError::UnknownPost(id))
    }

    fn send(&self, command: WallCommand) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }
}

impl Drop for WallClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }

        // Release the transport listener; without a runtime there is nothing
        // left to deliver to it anyway.
        let (Some(id), Ok(runtime)) = (
            self.subscription.take(),
            tokio::runtime::Handle::try_current(),
        ) else {
            return;
        };
        let pubsub = self.pubsub.clone();
        runtime.spawn(async move {
            if let Err(e) = pubsub.cancel(id).await {
                tracing::warn!(error = %e, "Failed to cancel wall subscription");
            }
        });
    }
}

async fn dispatch(
    mut state: WallState,
    mut inbox: mpsc::UnboundedReceiver<WallCommand>,
    publisher: watch::Sender<WallSnapshot>,
    clock: Arc<dyn Clock>,
) {
    while let Some(command) = inbox.recv().await {
        let changed = match command {
            WallCommand::Event(event) => {
                tracing::debug!(event = event.name(), post_id = %event.post_id(), "Wall event");
                state.apply(event)
            }
            WallCommand::Prune => {
                let pruned = state.prune_expired(clock.now());
                if pruned > 0 {
                    tracing::debug!(pruned, "Expired posts pruned");
                }
                pruned > 0
            }
            WallCommand::Connection(connected) => {
                let changed = state.is_connected() != connected;
                state.set_connected(connected);
                changed
            }
            WallCommand::NextZIndex(reply) => {
                let _ = reply.send(state.next_z_index());
                true
            }
            WallCommand::Lookup(id, reply) => {
                let _ = reply.send(state.get(id).cloned());
                false
            }
        };

        if changed {
            publisher.send_replace(WallSnapshot::from(&state));
        }
    }
}

/// Prune once right away, then on every interval tick.
async fn prune_ticks(commands: mpsc::UnboundedSender<WallCommand>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if commands.send(WallCommand::Prune).is_err() {
            break;
        }
    }
}
