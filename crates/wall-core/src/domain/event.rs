//! Broadcast events fanned out to every viewer of the wall.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Post;

/// Pub/sub channel carrying wall events.
pub const WALL_CHANNEL: &str = "ephemeral-wall";

/// A mutation of the wall, as published on [`WALL_CHANNEL`].
///
/// Wire form: `{"event": "new-post", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WallEvent {
    NewPost(Post),
    UpdatePost(Post),
    DeletePost { id: Uuid },
}

impl WallEvent {
    /// Event name as seen by subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            WallEvent::NewPost(_) => "new-post",
            WallEvent::UpdatePost(_) => "update-post",
            WallEvent::DeletePost { .. } => "delete-post",
        }
    }

    /// Id of the post the event concerns.
    pub fn post_id(&self) -> Uuid {
        match self {
            WallEvent::NewPost(post) | WallEvent::UpdatePost(post) => post.id,
            WallEvent::DeletePost { id } => *id,
        }
    }

    /// The `data` part of the event on its own.
    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            WallEvent::NewPost(post) | WallEvent::UpdatePost(post) => serde_json::to_value(post),
            WallEvent::DeletePost { id } => Ok(serde_json::json!({ "id": id })),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
