//! Migration: Create categories table.

use sea_orm_migration::prelude::*;

use super::schema::{audit_columns, id};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Categories::Table)
            .if_not_exists()
            .col(id(Categories::Id))
            .col(ColumnDef::new(Categories::Name).string().not_null().unique_key())
            .col(ColumnDef::new(Categories::Description).text().null());

        manager.create_table(audit_columns(&mut table).to_owned()).await?;

        // Index for the default soft-delete filter
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_is_deleted")
                    .table(Categories::Table)
                    .col(Categories::IsDeleted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Categories {
    Table,
    Id,
    Name,
    Description,
    IsDeleted,
}
