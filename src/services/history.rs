use crate::api::error::AppError;
use crate::entities::{prelude::*, request_history, request_history::FeatureType};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Append-only per-user ledger of feature invocations.
#[derive(Clone)]
pub struct HistoryService {
    db: DatabaseConnection,
}

impl HistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Writes one record. The owning user must still exist; auth upstream
    /// makes that the normal case, but it is checked anyway.
    pub async fn append(
        &self,
        user_id: &str,
        feature_type: FeatureType,
        original_input: String,
        ai_response: String,
        language: Option<String>,
    ) -> Result<request_history::Model, AppError> {
        let owner = Users::find_by_id(user_id).one(&self.db).await?;
        if owner.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let record = request_history::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            feature_type: Set(feature_type),
            original_input: Set(original_input),
            ai_response: Set(ai_response),
            language: Set(language),
            created_at: Set(Utc::now()),
        };

        Ok(record.insert(&self.db).await?)
    }

    /// Records for one user and feature, most recent first. Empty result is
    /// an empty list, not an error.
    pub async fn list(
        &self,
        user_id: &str,
        feature_type: FeatureType,
    ) -> Result<Vec<request_history::Model>, AppError> {
        let records = RequestHistory::find()
            .filter(request_history::Column::UserId.eq(user_id))
            .filter(request_history::Column::FeatureType.eq(feature_type))
            .order_by_desc(request_history::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(records)
    }

    pub async fn count_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        use sea_orm::PaginatorTrait;
        let count = RequestHistory::find()
            .filter(request_history::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

/// Drops every record a user owns. Runs inside the account-deletion
/// transaction; deleting zero rows is fine.
pub async fn delete_all_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<u64, sea_orm::DbErr> {
    let result = RequestHistory::delete_many()
        .filter(request_history::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
