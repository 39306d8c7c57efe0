use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interface_traffics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub traffic_id: i32,
    pub interface_id: i32,
    /// Bits per second.
    pub download_speed: f64,
    pub upload_speed: f64,
    pub timestamp: ChronoDateTimeUtc,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::interface_monitoring::Entity",
        from = "Column::InterfaceId",
        to = "super::interface_monitoring::Column::InterfaceId",
        on_delete = "Cascade"
    )]
    InterfaceMonitoring,
}

impl Related<super::interface_monitoring::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterfaceMonitoring.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
