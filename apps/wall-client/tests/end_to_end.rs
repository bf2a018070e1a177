//! Clients and the post service wired together over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wall_client::{ClientError, ClientOptions, WallApi, WallClient, WallSnapshot};
use wall_core::domain::{NewPost, Position, Post, PostPatch, WALL_CHANNEL};
use wall_core::ports::{Clock, PubSub};
use wall_core::{DomainError, PostService};
use wall_infra::{InMemoryPostRepository, InMemoryPubSub};
use wall_shared::dto::CreatePostRequest;

/// Calls the service directly, answering the way the HTTP layer would.
struct ServiceApi(PostService);

fn api_error(err: DomainError) -> ClientError {
    match err {
        DomainError::NotFound { .. } => ClientError::Api {
            status: 404,
            message: "Post not found".into(),
        },
        DomainError::Validation(message) => ClientError::Api {
            status: 400,
            message,
        },
        DomainError::Internal(_) => ClientError::Api {
            status: 500,
            message: "Internal server error".into(),
        },
    }
}

#[async_trait]
impl WallApi for ServiceApi {
    async fn list(&self) -> Result<Vec<Post>, ClientError> {
        self.0.list().await.map_err(api_error)
    }

    async fn create(&self, request: CreatePostRequest) -> Result<Post, ClientError> {
        let draft = NewPost {
            message: request.message,
            position: request.position.map(|p| Position {
                top: p.top,
                left: p.left,
            }),
            color: request.color,
            pin_color: request.pin_color,
            rotation: request.rotation,
            z_index: request.z_index,
        };
        self.0.create(draft).await.map_err(api_error)
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, ClientError> {
        self.0.update(id, patch).await.map_err(api_error)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.0.delete(id).await.map_err(api_error)
    }
}

struct Wall {
    service: PostService,
    broker: Arc<InMemoryPubSub>,
    pubsub: Arc<dyn PubSub>,
}

impl Wall {
    fn new() -> Self {
        let broker = Arc::new(InMemoryPubSub::default());
        let pubsub: Arc<dyn PubSub> = broker.clone();
        let service = PostService::new(Arc::new(InMemoryPostRepository::new()), pubsub.clone());
        Self {
            service,
            broker,
            pubsub,
        }
    }

    async fn client(&self) -> WallClient {
        self.client_with(ClientOptions::default()).await
    }

    async fn client_with(&self, options: ClientOptions) -> WallClient {
        let api = Arc::new(ServiceApi(self.service.clone()));
        WallClient::connect_with(api, self.pubsub.clone(), options)
            .await
            .expect("client connects")
    }
}

async fn wait_until(client: &WallClient, ready: impl FnMut(&WallSnapshot) -> bool) -> WallSnapshot {
    let mut changes = client.changes();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), changes.wait_for(ready))
        .await
        .expect("wall did not reach the expected state")
        .expect("client stopped")
        .clone();
    snapshot
}

fn hello() -> NewPost {
    NewPost {
        message: "Hello there".into(),
        position: Some(Position { top: 42.0, left: 17.0 }),
        color: "bg-yellow-100 border-yellow-300".into(),
        pin_color: "bg-red-500".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_new_note_reaches_every_viewer() {
    let wall = Wall::new();
    let alice = wall.client().await;
    let bob = wall.client().await;
    assert!(alice.is_connected() && bob.is_connected());

    let created = alice.submit("Hello there").await.unwrap();
    assert_eq!(created.likes, 0);
    assert!(!created.is_pinned);

    let seen = wait_until(&bob, |s| s.posts.iter().any(|p| p.id == created.id)).await;
    assert_eq!(seen.posts.len(), 1);
    assert_eq!(seen.posts[0], created);

    // The author also learns about its own note from the broadcast.
    wait_until(&alice, |s| s.posts.len() == 1).await;
}

#[tokio::test]
async fn test_update_reaches_list_and_viewers() {
    let wall = Wall::new();
    let created = wall.service.create(hello()).await.unwrap();
    let viewer = wall.client().await;

    wall.service
        .update(created.id, PostPatch::likes(3))
        .await
        .unwrap();

    let seen = wait_until(&viewer, |s| s.posts.first().is_some_and(|p| p.likes == 3)).await;
    assert_eq!(seen.posts[0].id, created.id);
    assert_eq!(wall.service.list().await.unwrap()[0].likes, 3);
}

#[tokio::test]
async fn test_client_actions_round_trip() {
    let wall = Wall::new();
    let created = wall.service.create(hello()).await.unwrap();
    let client = wall.client().await;

    client.like(created.id).await.unwrap();
    wait_until(&client, |s| s.posts[0].likes == 1).await;
    client.like(created.id).await.unwrap();
    wait_until(&client, |s| s.posts[0].likes == 2).await;

    client.toggle_pin(created.id).await.unwrap();
    wait_until(&client, |s| s.posts[0].is_pinned).await;

    let raised = client.raise(created.id).await.unwrap();
    assert_eq!(raised.z_index, 2);

    client.delete(created.id).await.unwrap();
    wait_until(&client, |s| s.posts.is_empty()).await;
}

#[tokio::test]
async fn test_rapid_creates_both_appear() {
    let wall = Wall::new();
    let client = wall.client().await;

    let (first, second) = tokio::join!(client.submit("First note"), client.submit("Second note"));
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first.z_index, second.z_index);

    let seen = wait_until(&client, |s| s.posts.len() == 2).await;
    assert!(seen.posts.iter().any(|p| p.id == first.id));
    assert!(seen.posts.iter().any(|p| p.id == second.id));
    assert_eq!(wall.service.list().await.unwrap().len(), 2);
}

struct LaterClock(DateTime<Utc>);

impl Clock for LaterClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[tokio::test]
async fn test_expired_notes_are_pruned_locally() {
    let wall = Wall::new();
    wall.service.create(hello()).await.unwrap();

    let options = ClientOptions {
        clock: Arc::new(LaterClock(Utc::now() + chrono::Duration::minutes(61))),
        prune_interval: Duration::from_millis(20),
    };
    let client = wall.client_with(options).await;

    wait_until(&client, |s| s.posts.is_empty()).await;
    // The service still considers the note live.
    assert_eq!(wall.service.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejections_surface_to_caller() {
    let wall = Wall::new();
    let client = wall.client().await;

    let err = client.submit("This is nsfw stuff").await.unwrap_err();
    assert!(
        matches!(&err, ClientError::Api { status: 400, message } if message == "Message contains inappropriate content")
    );

    let err = wall
        .service
        .delete(Uuid::new_v4())
        .await
        .map_err(api_error)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(wall.service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lost_subscription_shows_offline() {
    let wall = Wall::new();
    let client = wall.client().await;
    assert!(client.is_connected());

    wall.pubsub.unsubscribe(WALL_CHANNEL).await.unwrap();

    let seen = wait_until(&client, |s| !s.connected).await;
    assert!(!seen.connected);
}

#[tokio::test]
async fn test_raise_at_z_index_ceiling_keeps_client_alive() {
    let wall = Wall::new();
    let created = wall.service.create(hello()).await.unwrap();
    wall.service
        .update(created.id, PostPatch::z_index(i32::MAX))
        .await
        .unwrap();
    let client = wall.client().await;

    let raised = client.raise(created.id).await.unwrap();
    assert_eq!(raised.z_index, i32::MAX);

    let pinned = client.toggle_pin(created.id).await.unwrap();
    assert!(pinned.is_pinned);
}

#[tokio::test]
async fn test_dropping_client_releases_subscription() {
    let wall = Wall::new();
    let kept = wall.client().await;
    let dropped = wall.client().await;
    assert_eq!(wall.broker.listener_count(WALL_CHANNEL).await, 2);

    drop(dropped);

    tokio::time::timeout(Duration::from_secs(2), async {
        while wall.broker.listener_count(WALL_CHANNEL).await != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription was not released");

    // The remaining viewer still follows the wall.
    let created = wall.service.create(hello()).await.unwrap();
    wait_until(&kept, |s| s.posts.iter().any(|p| p.id == created.id)).await;
}
