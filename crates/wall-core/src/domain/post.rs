use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds a post stays on the wall after creation.
pub const POST_LIFETIME_SECS: i64 = 3600;

/// Longest message a post may carry, in characters.
pub const MAX_MESSAGE_CHARS: usize = 100;

/// Lifetime of a post as a chrono duration.
pub fn post_lifetime() -> Duration {
    Duration::seconds(POST_LIFETIME_SECS)
}

/// Placement of a note on the wall, in percent of the wall size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// Post entity - a sticky note pinned to the shared wall.
///
/// Serialized flat and camelCase; the same shape is used for HTTP responses
/// and broadcast payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub message: String,
    pub position_top: f64,
    pub position_left: f64,
    pub color: String,
    pub pin_color: String,
    pub rotation: f64,
    pub z_index: i32,
    pub is_pinned: bool,
    pub likes: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Post {
    /// Create a fresh, unpinned post that expires one lifetime after `created_at`.
    pub fn new(draft: NewPost, position: Position, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: draft.message,
            position_top: position.top,
            position_left: position.left,
            color: draft.color,
            pin_color: draft.pin_color,
            rotation: draft.rotation.unwrap_or_default(),
            z_index: match draft.z_index {
                Some(z) if z != 0 => z,
                _ => 1,
            },
            is_pinned: false,
            likes: 0,
            created_at,
            expires_at: created_at + post_lifetime(),
        }
    }

    pub fn position(&self) -> Position {
        Position {
            top: self.position_top,
            left: self.position_left,
        }
    }

    /// A post is live while its expiry lies strictly in the future.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Input for creating a post. Fields are optional so that missing input is
/// reported as a validation failure rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPost {
    pub message: String,
    pub position: Option<Position>,
    pub color: String,
    pub pin_color: String,
    pub rotation: Option<f64>,
    pub z_index: Option<i32>,
}

/// Partial update of a stored post.
///
/// Every stored field except `id` may be overwritten. Values are applied as
/// given; there is no per-field policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PostPatch {
    pub fn z_index(z_index: i32) -> Self {
        Self {
            z_index: Some(z_index),
            ..Self::default()
        }
    }

    pub fn pinned(is_pinned: bool) -> Self {
        Self {
            is_pinned: Some(is_pinned),
            ..Self::default()
        }
    }

    pub fn likes(likes: u32) -> Self {
        Self {
            likes: Some(likes),
            ..Self::default()
        }
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(self, post: &mut Post) {
        if let Some(message) = self.message {
            post.message = message;
        }
        if let Some(top) = self.position_top {
            post.position_top = top;
        }
        if let Some(left) = self.position_left {
            post.position_left = left;
        }
        if let Some(color) = self.color {
            post.color = color;
        }
        if let Some(pin_color) = self.pin_color {
            post.pin_color = pin_color;
        }
        if let Some(rotation) = self.rotation {
            post.rotation = rotation;
        }
        if let Some(z_index) = self.z_index {
            post.z_index = z_index;
        }
        if let Some(is_pinned) = self.is_pinned {
            post.is_pinned = is_pinned;
        }
        if let Some(likes) = self.likes {
            post.likes = likes;
        }
        if let Some(created_at) = self.created_at {
            post.created_at = created_at;
        }
        if let Some(expires_at) = self.expires_at {
            post.expires_at = expires_at;
        }
    }
}
