//! # Wall Client
//!
//! Live, locally reconciled view of the ephemeral wall.
//!
//! The client fetches the current posts once, then follows the broadcast
//! channel. Its own actions go to the HTTP API and come back to it, like to
//! every other viewer, as broadcast events.

pub mod api;
pub mod client;
pub mod error;
pub mod placement;
pub mod state;

pub use api::{HttpWallApi, WallApi};
pub use client::{ClientOptions, WallClient, WallSnapshot};
pub use error::ClientError;
pub use state::WallState;
