use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interface_monitorings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub interface_id: i32,
    pub interface_name: String,
    pub router_id: Uuid,
    /// Excluded interfaces are still sampled for traffic but never pinged.
    pub is_excluded: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::router::Entity",
        from = "Column::RouterId",
        to = "super::router::Column::RouterId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Router,

    #[sea_orm(has_many = "super::interface_traffic::Entity")]
    InterfaceTraffic,
}

impl Related<super::router::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Router.def()
    }
}

impl Related<super::interface_traffic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterfaceTraffic.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
