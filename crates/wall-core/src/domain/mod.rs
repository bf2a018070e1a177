//! Domain entities - the core business objects.

mod event;
mod post;

pub use event::{WALL_CHANNEL, WallEvent};
pub use post::{
    MAX_MESSAGE_CHARS, NewPost, POST_LIFETIME_SECS, Position, Post, PostPatch, post_lifetime,
};
