use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "routers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub router_id: Uuid,
    pub router_name: String,
    pub router_address: String,
    pub router_port: i32,
    pub router_status: String,
    pub router_type: String,
    /// `API-SSL` selects TLS, anything else the plaintext API.
    pub router_remote_type: String,
    pub router_username: String,
    /// Hex of nonce + AES-256-GCM ciphertext.
    #[serde(skip_serializing)]
    pub router_password: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interface_monitoring::Entity")]
    InterfaceMonitoring,
}

impl Related<super::interface_monitoring::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterfaceMonitoring.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
