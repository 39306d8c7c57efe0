use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::db::entities::log;
use crate::db::models::LogEntry;

/// Width of the `log_description` column.
const MAX_DESCRIPTION_LEN: usize = 255;

pub async fn insert_log(db: &DatabaseConnection, entry: LogEntry) -> Result<log::Model, DbErr> {
    let new_log = log::ActiveModel {
        executor: Set(entry.executor),
        log_type: Set(entry.log_type),
        log_status: Set(entry.status),
        log_description: Set(truncate_description(&entry.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_log.insert(db).await
}

fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_LEN {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_DESCRIPTION_LEN - 3).collect();
    truncated.push_str("...");
    truncated
}
