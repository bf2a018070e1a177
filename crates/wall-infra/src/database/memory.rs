//! In-memory post store - used when no database is configured.
//!
//! Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use wall_core::domain::Post;
use wall_core::error::RepoError;
use wall_core::ports::{BaseRepository, PostRepository};

/// Post store backed by a `HashMap` behind an async `RwLock`.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts, expired ones included.
    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!(
                "post {} already exists",
                post.id
            )));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let slot = posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let mut live: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.is_live(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|_, post| post.is_live(now));
        Ok((before - posts.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wall_core::domain::{NewPost, Position};

    fn post_at(message: &str, created_at: DateTime<Utc>) -> Post {
        let draft = NewPost {
            message: message.to_string(),
            color: "bg-pink-100 border-pink-300".to_string(),
            pin_color: "bg-pink-500".to_string(),
            ..Default::default()
        };
        Post::new(draft, Position { top: 50.0, left: 50.0 }, created_at)
    }

    #[tokio::test]
    async fn test_find_live_filters_and_orders() {
        let repo = InMemoryPostRepository::new();
        let now = Utc::now();

        let old = post_at("an hour ago", now - Duration::hours(1));
        let older = post_at("forty minutes ago", now - Duration::minutes(40));
        let recent = post_at("just now", now);
        for post in [old.clone(), older.clone(), recent.clone()] {
            repo.insert(post).await.unwrap();
        }

        let live = repo.find_live(now).await.unwrap();
        assert_eq!(
            live.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![recent.id, older.id]
        );
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn test_delete_expired_counts_removed_rows() {
        let repo = InMemoryPostRepository::new();
        let now = Utc::now();
        repo.insert(post_at("stale note", now - Duration::hours(2)))
            .await
            .unwrap();
        repo.insert(post_at("fresh note", now)).await.unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_are_not_found() {
        let repo = InMemoryPostRepository::new();
        let post = post_at("never stored", Utc::now());

        assert!(matches!(repo.update(post.clone()).await, Err(RepoError::NotFound)));
        assert!(matches!(repo.delete(post.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryPostRepository::new();
        let post = post_at("only once", Utc::now());

        repo.insert(post.clone()).await.unwrap();
        assert!(matches!(repo.insert(post).await, Err(RepoError::Constraint(_))));
    }
}
