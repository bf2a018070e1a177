//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Placement of a new note, in percent of the wall size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub top: f64,
    pub left: f64,
}

/// Request to pin a new note to the wall.
///
/// Every field tolerates being absent so the server can answer with a
/// readable "missing fields" error instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub position: Option<PositionDto>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub pin_color: String,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub z_index: Option<i32>,
}

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
