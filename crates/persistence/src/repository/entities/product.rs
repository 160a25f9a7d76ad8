//! Product database entity.

use sea_orm::entity::prelude::*;

use crate::entity::{AuditedEntity, EntitySchema};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price: Decimal,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(has_many = "super::product_image::Entity")]
    Images,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
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
