//! Wall post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use wall_core::domain::{NewPost, Position, PostPatch};
use wall_shared::dto::{CreatePostRequest, MessageResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let draft = NewPost {
        message: req.message,
        position: req.position.map(|p| Position {
            top: p.top,
            left: p.left,
        }),
        color: req.color,
        pin_color: req.pin_color,
        rotation: req.rotation,
        z_index: req.z_index,
    };

    let post = state.posts.create(draft).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PATCH /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PostPatch>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.posts.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}
