//! # Wall Shared
//!
//! Request and response types shared by the API server and wall clients.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
