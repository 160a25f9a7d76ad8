//! Migration: Create product_images table.

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_products_table::Products;
use super::schema::{audit_columns, id, owned_fk};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(ProductImages::Table)
            .if_not_exists()
            .col(id(ProductImages::Id))
            .col(ColumnDef::new(ProductImages::ProductId).big_integer().not_null())
            .col(ColumnDef::new(ProductImages::Url).string().not_null())
            .col(
                ColumnDef::new(ProductImages::Position)
                    .integer()
                    .not_null()
                    .default(0),
            );

        // Images belong to their product and go with it
        audit_columns(&mut table).foreign_key(&mut owned_fk(
            "fk_product_images_product",
            (ProductImages::Table, ProductImages::ProductId),
            (Products::Table, Products::Id),
        ));

        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_images_product_id")
                    .table(ProductImages::Table)
                    .col(ProductImages::ProductId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductImages {
    Table,
    Id,
    ProductId,
    Url,
    Position,
}
