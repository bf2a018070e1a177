//! Local copy of the wall, reconciled from broadcast events.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wall_core::domain::{Post, WallEvent};

/// Posts currently shown, the local stacking counter, and link status.
#[derive(Debug, Clone, Default)]
pub struct WallState {
    posts: Vec<Post>,
    highest_z_index: i32,
    connected: bool,
}

impl WallState {
    /// Seed from a fetched post list; the stacking counter starts at the
    /// highest z-index seen, or 0 for an empty wall.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let highest_z_index = posts.iter().map(|p| p.z_index).max().unwrap_or(0).max(0);
        Self {
            posts,
            highest_z_index,
            connected: false,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: Uuid) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn highest_z_index(&self) -> i32 {
        self.highest_z_index
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Reserve the next stacking value. Saturates at `i32::MAX`, so once a
    /// note sits at the ceiling further raises tie with it instead of wrapping
    /// to the bottom.
    pub fn next_z_index(&mut self) -> i32 {
        self.highest_z_index = self.highest_z_index.saturating_add(1);
        self.highest_z_index
    }

    /// Reconcile one broadcast event. Returns whether the post list changed.
    ///
    /// Duplicate `new-post` deliveries and updates or deletes for posts not
    /// shown locally are ignored.
    pub fn apply(&mut self, event: WallEvent) -> bool {
        match event {
            WallEvent::NewPost(post) => {
                if self.get(post.id).is_some() {
                    return false;
                }
                self.posts.push(post);
                true
            }
            WallEvent::UpdatePost(post) => match self.posts.iter_mut().find(|p| p.id == post.id) {
                Some(slot) => {
                    *slot = post;
                    true
                }
                None => false,
            },
            WallEvent::DeletePost { id } => {
                let before = self.posts.len();
                self.posts.retain(|p| p.id != id);
                self.posts.len() != before
            }
        }
    }

    /// Drop posts whose expiry has passed. Returns how many were dropped.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.posts.len();
        self.posts.retain(|p| p.is_live(now));
        before - self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wall_core::domain::{NewPost, Position};

    fn post(message: &str, z_index: i32, created_at: DateTime<Utc>) -> Post {
        let draft = NewPost {
            message: message.to_string(),
            color: "bg-teal-100 border-teal-300".to_string(),
            pin_color: "bg-green-500".to_string(),
            z_index: Some(z_index),
            ..Default::default()
        };
        Post::new(draft, Position { top: 15.0, left: 35.0 }, created_at)
    }

    #[test]
    fn test_seeds_counter_from_highest_z_index() {
        let now = Utc::now();
        let mut state = WallState::from_posts(vec![post("low", 2, now), post("high", 9, now)]);

        assert_eq!(state.highest_z_index(), 9);
        assert_eq!(state.next_z_index(), 10);
        assert_eq!(state.next_z_index(), 11);

        assert_eq!(WallState::from_posts(Vec::new()).highest_z_index(), 0);
    }

    #[test]
    fn test_counter_saturates_at_ceiling() {
        let mut state = WallState::from_posts(vec![post("on top", i32::MAX, Utc::now())]);

        assert_eq!(state.highest_z_index(), i32::MAX);
        assert_eq!(state.next_z_index(), i32::MAX);
        assert_eq!(state.next_z_index(), i32::MAX);
    }

    #[test]
    fn test_new_post_is_deduplicated() {
        let mut state = WallState::default();
        let note = post("Hello there", 1, Utc::now());

        assert!(state.apply(WallEvent::NewPost(note.clone())));
        assert!(!state.apply(WallEvent::NewPost(note.clone())));
        assert_eq!(state.posts().len(), 1);
    }

    #[test]
    fn test_update_replaces_wholesale() {
        let note = post("Hello there", 1, Utc::now());
        let mut state = WallState::from_posts(vec![note.clone()]);

        let mut changed = note.clone();
        changed.likes = 3;
        changed.is_pinned = true;
        assert!(state.apply(WallEvent::UpdatePost(changed.clone())));
        assert_eq!(state.get(note.id), Some(&changed));

        // Updates for posts we never saw are dropped.
        assert!(!state.apply(WallEvent::UpdatePost(post("elsewhere", 1, Utc::now()))));
        assert_eq!(state.posts().len(), 1);
    }

    #[test]
    fn test_delete_removes_by_id() {
        let note = post("Hello there", 1, Utc::now());
        let mut state = WallState::from_posts(vec![note.clone()]);

        assert!(state.apply(WallEvent::DeletePost { id: note.id }));
        assert!(state.posts().is_empty());
        assert!(!state.apply(WallEvent::DeletePost { id: note.id }));
    }

    #[test]
    fn test_prune_drops_only_expired() {
        let now = Utc::now();
        let stale = post("stale", 1, now - Duration::minutes(61));
        let fresh = post("fresh", 1, now - Duration::minutes(59));
        let mut state = WallState::from_posts(vec![stale, fresh.clone()]);

        assert_eq!(state.prune_expired(now), 1);
        assert_eq!(state.posts(), &[fresh]);
    }

    #[test]
    fn test_out_of_order_creates_keep_both() {
        let now = Utc::now();
        let first = post("first", 1, now);
        let second = post("second", 2, now + Duration::milliseconds(5));
        let mut state = WallState::default();

        state.apply(WallEvent::NewPost(second.clone()));
        state.apply(WallEvent::NewPost(first.clone()));
        state.apply(WallEvent::NewPost(second.clone()));

        let mut ids: Vec<Uuid> = state.posts().iter().map(|p| p.id).collect();
        ids.sort();
        let mut expected = vec![first.id, second.id];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
