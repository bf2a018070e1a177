//! Liveness probe.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    /// Posts currently on the wall; absent when the store is unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_posts: Option<usize>,
}

/// GET /api/health
///
/// 200 with `ok` while the post store answers, 503 with `degraded` otherwise.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let live_posts = match state.posts.list().await {
        Ok(posts) => Some(posts.len()),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the post store");
            None
        }
    };

    let body = HealthResponse {
        status: if live_posts.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        live_posts,
    };

    match body.live_posts {
        Some(_) => HttpResponse::Ok().json(body),
        None => HttpResponse::ServiceUnavailable().json(body),
    }
}
