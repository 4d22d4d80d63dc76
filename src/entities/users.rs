use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    /// Stored trimmed and lowercased; every lookup normalizes the same way.
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    /// 6-digit code; set and cleared together with `otp_created_at`.
    pub otp: Option<String>,
    pub otp_created_at: Option<DateTimeUtc>,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::request_history::Entity")]
    RequestHistory,
}

impl Related<super::request_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
