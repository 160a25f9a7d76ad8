//! Migration: Create products table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_categories_table::Categories;
use super::schema::{audit_columns, id, money, restrict_fk};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Products::Table)
            .if_not_exists()
            .col(id(Products::Id))
            .col(ColumnDef::new(Products::CategoryId).big_integer().not_null())
            .col(ColumnDef::new(Products::Name).string().not_null())
            .col(ColumnDef::new(Products::Sku).string().not_null().unique_key())
            .col(money(Products::Price));

        audit_columns(&mut table).foreign_key(&mut restrict_fk(
            "fk_products_category",
            (Products::Table, Products::CategoryId),
            (Categories::Table, Categories::Id),
        ));

        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category_id")
                    .table(Products::Table)
                    .col(Products::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_is_deleted")
                    .table(Products::Table)
                    .col(Products::IsDeleted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    CategoryId,
    Name,
    Sku,
    Price,
    IsDeleted,
}
