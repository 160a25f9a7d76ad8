//! Product image database entity. Images are owned by their product.

use sea_orm::entity::prelude::*;

use crate::entity::{AuditedEntity, EntitySchema};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "product_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub position: i32,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
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
