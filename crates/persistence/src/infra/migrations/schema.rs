//! Schema helpers shared by the migrations.
//!
//! Foreign keys built here block deleting a referenced row unless the
//! relation is an ownership one, and money columns are always
//! `decimal(18, 2)`.

use sea_orm_migration::prelude::*;

/// Audited base columns.
#[derive(DeriveIden)]
pub enum Audit {
    CreatedBy,
    CreatedAt,
    LastModifiedBy,
    LastModifiedAt,
    IsDeleted,
}

/// Auto-increment `bigint` primary key.
pub fn id<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

/// Currency column, `decimal(18, 2) NOT NULL`.
///
/// Spelled as a custom type: the SQLite builder refuses a decimal
/// precision above 16, while SQLite itself takes the declaration as is.
pub fn money<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .custom(Alias::new("decimal(18, 2)"))
        .not_null()
        .to_owned()
}

/// Append the audited base columns to a table definition.
pub fn audit_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(Audit::CreatedBy).string().not_null())
        .col(
            ColumnDef::new(Audit::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(Audit::LastModifiedBy).string().null())
        .col(
            ColumnDef::new(Audit::LastModifiedAt)
                .timestamp_with_time_zone()
                .null(),
        )
        .col(
            ColumnDef::new(Audit::IsDeleted)
                .boolean()
                .not_null()
                .default(false),
        )
}

/// Foreign key that blocks deleting a referenced row.
///
/// `NO ACTION` rather than `RESTRICT`: both refuse the delete, but SQLite
/// reports `RESTRICT` through a trigger error code instead of the foreign
/// key one.
pub fn restrict_fk<FT, FC, TT, TC>(name: &str, from: (FT, FC), to: (TT, TC)) -> ForeignKeyCreateStatement
where
    FT: IntoIden + 'static,
    FC: IntoIden + 'static,
    TT: IntoIden + 'static,
    TC: IntoIden + 'static,
{
    foreign_key(name, from, to, ForeignKeyAction::NoAction)
}

/// Foreign key for an ownership relation: dependents go with their owner.
pub fn owned_fk<FT, FC, TT, TC>(name: &str, from: (FT, FC), to: (TT, TC)) -> ForeignKeyCreateStatement
where
    FT: IntoIden + 'static,
    FC: IntoIden + 'static,
    TT: IntoIden + 'static,
    TC: IntoIden + 'static,
{
    foreign_key(name, from, to, ForeignKeyAction::Cascade)
}

fn foreign_key<FT, FC, TT, TC>(
    name: &str,
    from: (FT, FC),
    to: (TT, TC),
    on_delete: ForeignKeyAction,
) -> ForeignKeyCreateStatement
where
    FT: IntoIden + 'static,
    FC: IntoIden + 'static,
    TT: IntoIden + 'static,
    TC: IntoIden + 'static,
{
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(on_delete)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::sea_query::{PostgresQueryBuilder, SqliteQueryBuilder};

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        Total,
        CustomerId,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
    }

    fn orders_table() -> TableCreateStatement {
        let mut table = Table::create();
        table
            .table(Orders::Table)
            .col(&mut id(Orders::Id))
            .col(&mut money(Orders::Total))
            .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null());
        audit_columns(&mut table)
            .foreign_key(&mut restrict_fk(
                "fk_orders_customer",
                (Orders::Table, Orders::CustomerId),
                (Customers::Table, Customers::Id),
            ))
            .to_owned()
    }

    #[test]
    fn test_money_is_decimal_18_2() {
        let sql = orders_table().to_string(PostgresQueryBuilder);
        assert!(sql.contains("decimal(18, 2)"), "{sql}");
    }

    #[test]
    fn test_money_renders_on_sqlite() {
        let sql = orders_table().to_string(SqliteQueryBuilder);
        assert!(sql.contains("decimal(18, 2) NOT NULL"), "{sql}");
    }

    #[test]
    fn test_foreign_keys_block_deletes_by_default() {
        let sql = orders_table().to_string(PostgresQueryBuilder);
        assert!(sql.contains("ON DELETE NO ACTION"), "{sql}");
        assert!(!sql.contains("ON DELETE CASCADE"), "{sql}");
    }

    #[test]
    fn test_audit_columns_present() {
        let sql = orders_table().to_string(PostgresQueryBuilder);
        for column in ["created_by", "created_at", "last_modified_by", "last_modified_at", "is_deleted"] {
            assert!(sql.contains(column), "missing {column} in {sql}");
        }
        assert!(sql.contains("DEFAULT FALSE"), "{sql}");
    }

    #[test]
    fn test_owned_fk_cascades() {
        let fk = owned_fk(
            "fk_orders_customer",
            (Orders::Table, Orders::CustomerId),
            (Customers::Table, Customers::Id),
        );
        let sql = Table::create()
            .table(Orders::Table)
            .col(&mut id(Orders::Id))
            .foreign_key(&mut fk.clone())
            .to_string(PostgresQueryBuilder);
        assert!(sql.contains("ON DELETE CASCADE"), "{sql}");
    }
}
