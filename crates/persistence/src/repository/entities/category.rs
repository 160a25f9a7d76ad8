//! Category database entity.

use sea_orm::entity::prelude::*;

use crate::entity::{AuditedEntity, EntitySchema};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AuditedEntity for Entity {
    fn schema() -> EntitySchema<Self> {
        EntitySchema {
            id: Column::Id,
            created_by: Column::CreatedBy,
            created_at: Column::CreatedAt,
            last_modified_by: Column::LastModifiedBy,
            last_modified_at: Column::LastModifiedAt,
            is_deleted: Column::IsDeleted,
        }
    }
}
