pub mod entities;
pub mod enums;
pub mod models;
pub mod services;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::info;

use entities::{interface_monitoring, interface_traffic, log, router};

/// Creates the tables this service reads and writes when they do not exist yet.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = [
        schema.create_table_from_entity(router::Entity),
        schema.create_table_from_entity(interface_monitoring::Entity),
        schema.create_table_from_entity(interface_traffic::Entity),
        schema.create_table_from_entity(log::Entity),
    ];
    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(&*statement)).await?;
    }

    info!("Database schema is in place.");
    Ok(())
}
