//! # Wall Core
//!
//! The domain layer of the ephemeral wall.
//! This crate contains the post model, content moderation, and the post
//! service, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod moderation;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::PostService;
