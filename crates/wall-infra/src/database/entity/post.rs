//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub position_top: f64,
    pub position_left: f64,
    pub color: String,
    pub pin_color: String,
    pub rotation: f64,
    pub z_index: i32,
    pub is_pinned: bool,
    pub likes: i64,
    pub created_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for wall_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            message: model.message,
            position_top: model.position_top,
            position_left: model.position_left,
            color: model.color,
            pin_color: model.pin_color,
            rotation: model.rotation,
            z_index: model.z_index,
            is_pinned: model.is_pinned,
            likes: model.likes.clamp(0, i64::from(u32::MAX)) as u32,
            created_at: model.created_at.into(),
            expires_at: model.expires_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<wall_core::domain::Post> for ActiveModel {
    fn from(post: wall_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            message: Set(post.message),
            position_top: Set(post.position_top),
            position_left: Set(post.position_left),
            color: Set(post.color),
            pin_color: Set(post.pin_color),
            rotation: Set(post.rotation),
            z_index: Set(post.z_index),
            is_pinned: Set(post.is_pinned),
            likes: Set(i64::from(post.likes)),
            created_at: Set(post.created_at.into()),
            expires_at: Set(post.expires_at.into()),
        }
    }
}
