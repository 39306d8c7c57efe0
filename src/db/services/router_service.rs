use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::db::entities::{prelude::*, router};

/// A router that has not been soft-deleted.
pub async fn get_router_by_id(
    db: &DatabaseConnection,
    router_id: Uuid,
) -> Result<Option<router::Model>, DbErr> {
    Router::find_by_id(router_id)
        .filter(router::Column::IsDeleted.eq(false))
        .one(db)
        .await
}
