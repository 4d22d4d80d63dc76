use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category of AI-assisted operation a history row was produced by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    #[sea_orm(string_value = "pdf")]
    Pdf,
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "audio")]
    Audio,
    #[sea_orm(string_value = "tone")]
    Tone,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Pdf => "pdf",
            FeatureType::Image => "image",
            FeatureType::Audio => "audio",
            FeatureType::Tone => "tone",
        }
    }
}

impl std::str::FromStr for FeatureType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(FeatureType::Pdf),
            "image" => Ok(FeatureType::Image),
            "audio" => Ok(FeatureType::Audio),
            "tone" => Ok(FeatureType::Tone),
            _ => Err(()),
        }
    }
}

/// Immutable record of one feature invocation: what went in, what the
/// model returned. Rows are never updated, only bulk-deleted when the
/// owning account is deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub feature_type: FeatureType,
    #[sea_orm(column_type = "Text")]
    pub original_input: String,
    #[sea_orm(column_type = "Text")]
    pub ai_response: String,
    pub language: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
