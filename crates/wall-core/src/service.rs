//! Post service - validates, persists, and broadcasts every wall mutation.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{MAX_MESSAGE_CHARS, NewPost, Post, PostPatch, WALL_CHANNEL, WallEvent};
use crate::error::{DomainError, RepoError};
use crate::moderation;
use crate::ports::{Clock, PostRepository, PubSub, SystemClock};

/// Orchestrates moderation, the post store, and the broadcast channel.
///
/// Store and broadcast failures surface as [`DomainError::Internal`]. Nothing
/// is retried or rolled back: a post persisted before a failed broadcast stays
/// persisted.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    pubsub: Arc<dyn PubSub>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, pubsub: Arc<dyn PubSub>) -> Self {
        Self::with_clock(repo, pubsub, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repo: Arc<dyn PostRepository>,
        pubsub: Arc<dyn PubSub>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            pubsub,
            clock,
        }
    }

    /// Validate and store a new post, then announce it with `new-post`.
    pub async fn create(&self, draft: NewPost) -> Result<Post, DomainError> {
        let position = match draft.position {
            Some(position)
                if !draft.message.is_empty()
                    && !draft.color.is_empty()
                    && !draft.pin_color.is_empty() =>
            {
                position
            }
            _ => return Err(DomainError::Validation("Missing required fields".to_string())),
        };

        if draft.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DomainError::Validation("Message is too long".to_string()));
        }

        if let Err(rejection) = moderation::moderate(&draft.message) {
            tracing::debug!(reason = %rejection, "Post rejected by moderation");
            return Err(rejection.into());
        }

        let post = Post::new(draft, position, self.clock.now());
        let post = self.repo.insert(post).await?;
        tracing::info!(post_id = %post.id, expires_at = %post.expires_at, "Post created");

        self.broadcast(&WallEvent::NewPost(post.clone())).await?;
        Ok(post)
    }

    /// Live posts, newest first. Expired rows are filtered, not removed.
    pub async fn list(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.repo.find_live(self.clock.now()).await?;
        Ok(posts)
    }

    /// Overwrite the patched fields of a post and announce it with `update-post`.
    pub async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, DomainError> {
        let mut post = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))?;

        patch.apply_to(&mut post);

        let post = match self.repo.update(post).await {
            Ok(post) => post,
            // Deleted between the read and the write.
            Err(RepoError::NotFound) => return Err(DomainError::post_not_found(id)),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(post_id = %post.id, "Post updated");

        self.broadcast(&WallEvent::UpdatePost(post.clone())).await?;
        Ok(post)
    }

    /// Remove a post and announce it with `delete-post`.
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(DomainError::post_not_found(id));
        }

        match self.repo.delete(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(DomainError::post_not_found(id)),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(post_id = %id, "Post deleted");

        self.broadcast(&WallEvent::DeletePost { id }).await
    }

    /// Drop expired rows from the store. Viewers prune locally, so nothing is
    /// broadcast.
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let removed = self.repo.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired posts");
        }
        Ok(removed)
    }

    async fn broadcast(&self, event: &WallEvent) -> Result<(), DomainError> {
        let payload = event
            .to_payload()
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        self.pubsub
            .publish(WALL_CHANNEL, &payload)
            .await
            .map_err(|e| {
                tracing::error!(event = event.name(), post_id = %event.post_id(), error = %e, "Broadcast failed");
                DomainError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::Position;
    use crate::ports::{BaseRepository, MessageHandler, PubSubError, StatusHandler, SubscriptionId};

    #[derive(Default)]
    struct VecRepository {
        posts: Mutex<HashMap<Uuid, Post>>,
    }

    #[async_trait]
    impl BaseRepository<Post, Uuid> for VecRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, post: Post) -> Result<Post, RepoError> {
            self.posts.lock().unwrap().insert(post.id, post.clone());
            Ok(post)
        }

        async fn update(&self, post: Post) -> Result<Post, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            match posts.get_mut(&post.id) {
                Some(slot) => {
                    *slot = post.clone();
                    Ok(post)
                }
                None => Err(RepoError::NotFound),
            }
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl PostRepository for VecRepository {
        async fn find_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
            let mut live: Vec<Post> = self
                .posts
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.is_live(now))
                .cloned()
                .collect();
            live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(live)
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|_, p| p.is_live(now));
            Ok((before - posts.len()) as u64)
        }
    }

    #[derive(Default)]
    struct RecordingPubSub {
        published: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingPubSub {
        fn events(&self) -> Vec<WallEvent> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .map(|(_, payload)| WallEvent::from_payload(payload).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl PubSub for RecordingPubSub {
        async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
            if self.fail {
                return Err(PubSubError::PublishError("broker down".to_string()));
            }
            self.published
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
            Ok(())
        }

        async fn subscribe_with_status(
            &self,
            _channel: &str,
            _handler: MessageHandler,
            _on_status: StatusHandler,
        ) -> Result<SubscriptionId, PubSubError> {
            Ok(SubscriptionId::new())
        }

        async fn cancel(&self, _id: SubscriptionId) -> Result<(), PubSubError> {
            Ok(())
        }

        async fn unsubscribe(&self, _channel: &str) -> Result<(), PubSubError> {
            Ok(())
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn draft(message: &str) -> NewPost {
        NewPost {
            message: message.to_string(),
            position: Some(Position { top: 30.0, left: 60.0 }),
            color: "bg-green-100 border-green-300".to_string(),
            pin_color: "bg-emerald-500".to_string(),
            rotation: Some(-1.0),
            z_index: Some(2),
        }
    }

    fn setup() -> (PostService, Arc<VecRepository>, Arc<RecordingPubSub>, Arc<ManualClock>) {
        let repo = Arc::new(VecRepository::default());
        let pubsub = Arc::new(RecordingPubSub::default());
        let clock = Arc::new(ManualClock::at(start()));
        let service = PostService::with_clock(repo.clone(), pubsub.clone(), clock.clone());
        (service, repo, pubsub, clock)
    }

    #[tokio::test]
    async fn test_create_sets_expiry_and_broadcasts() {
        let (service, _repo, pubsub, _clock) = setup();

        let post = service.create(draft("Hello there")).await.unwrap();

        assert_eq!(post.created_at, start());
        assert_eq!((post.expires_at - post.created_at).num_milliseconds(), 3_600_000);
        assert!(!post.is_pinned);
        assert_eq!(post.likes, 0);

        let published = pubsub.published.lock().unwrap().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, WALL_CHANNEL);
        assert_eq!(pubsub.events(), vec![WallEvent::NewPost(post)]);
    }

    #[tokio::test]
    async fn test_create_rejects_without_side_effects() {
        let (service, repo, pubsub, _clock) = setup();

        let err = service.create(draft("!!!")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref reason) if reason == "Message appears to be random characters"));

        let mut missing = draft("Hello there");
        missing.position = None;
        let err = service.create(missing).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref reason) if reason == "Missing required fields"));

        let mut missing = draft("Hello there");
        missing.pin_color.clear();
        assert!(matches!(
            service.create(missing).await,
            Err(DomainError::Validation(_))
        ));

        let err = service.create(draft(&"a".repeat(101))).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref reason) if reason == "Message is too long"));

        assert!(repo.posts.lock().unwrap().is_empty());
        assert!(pubsub.events().is_empty());
    }

    #[tokio::test]
    async fn test_list_hides_expired_posts_newest_first() {
        let (service, repo, _pubsub, clock) = setup();

        let first = service.create(draft("first note")).await.unwrap();
        clock.advance(Duration::minutes(30));
        let second = service.create(draft("second note")).await.unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        // Exactly at expiry the first post is gone.
        clock.advance(Duration::minutes(30));
        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
        assert!(listed.iter().all(|p| p.expires_at > clock.now()));

        // Filtering does not delete.
        assert_eq!(repo.posts.lock().unwrap().len(), 2);
        assert_eq!(service.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_applies_patch_and_broadcasts() {
        let (service, _repo, pubsub, _clock) = setup();
        let post = service.create(draft("Hello there")).await.unwrap();

        let updated = service.update(post.id, PostPatch::likes(3)).await.unwrap();
        assert_eq!(updated.likes, 3);
        assert_eq!(updated.expires_at, post.expires_at);

        let listed = service.list().await.unwrap();
        assert_eq!(listed[0].likes, 3);

        match pubsub.events().last() {
            Some(WallEvent::UpdatePost(broadcast)) => assert_eq!(broadcast.likes, 3),
            other => panic!("expected update-post, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mutating_unknown_post_is_not_found() {
        let (service, _repo, pubsub, _clock) = setup();
        let id = Uuid::new_v4();

        assert!(matches!(
            service.delete(id).await,
            Err(DomainError::NotFound { id: missing, .. }) if missing == id
        ));
        assert!(matches!(
            service.update(id, PostPatch::pinned(true)).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(pubsub.events().is_empty());
    }

    #[tokio::test]
    async fn test_delete_broadcasts_id() {
        let (service, _repo, pubsub, _clock) = setup();
        let post = service.create(draft("Hello there")).await.unwrap();

        service.delete(post.id).await.unwrap();

        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(
            pubsub.events().last(),
            Some(&WallEvent::DeletePost { id: post.id })
        );
    }

    #[tokio::test]
    async fn test_broadcast_failure_keeps_persisted_post() {
        let repo = Arc::new(VecRepository::default());
        let pubsub = Arc::new(RecordingPubSub {
            fail: true,
            ..Default::default()
        });
        let service = PostService::new(repo.clone(), pubsub);

        let err = service.create(draft("Hello there")).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(repo.posts.lock().unwrap().len(), 1);
    }
}
