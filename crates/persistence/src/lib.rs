//! Persistence Library
//!
//! Audited, soft-delete aware data access over SeaORM:
//! - [`GenericRepository`] for paged, projected and filtered reads and
//!   auto-committing writes on any [`AuditedEntity`]
//! - [`UnitOfWork`] for request-scoped staging, `save` and closure-scoped
//!   transactions
//! - [`RawQuery`] for literal SQL and stored procedure calls
//!
//! It also carries the sample catalog schema with its migrations and a
//! small service on top, used by the `persistence` CLI.

pub mod audit;
pub mod changes;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod infra;
pub mod query;
pub mod raw;
pub mod repository;
pub mod retry;
pub mod service;
pub mod unit_of_work;

use std::sync::Arc;

use tracing::info;

pub use crate::config::PersistenceConfig;
pub use crate::context::{StagedChange, StorageContext};
pub use crate::entity::{AuditedEntity, EntitySchema};
pub use crate::error::{Operation, OperationKind};
pub use crate::infra::{Database, Migrator};
pub use crate::query::{DeletedScope, Projection, QuerySpec};
pub use crate::raw::{CommandKind, RawCommand, RawQuery};
pub use crate::repository::GenericRepository;
pub use crate::retry::RetryPolicy;
pub use crate::unit_of_work::{TransactionContext, UnitOfWork};

use domain::{Anonymous, AuditContext, SystemClock};

/// Audit context for callers without an identity, from configuration.
pub fn system_audit_context(config: &PersistenceConfig) -> Result<AuditContext, Box<dyn std::error::Error>> {
    let clock = SystemClock::with_offset_hours(config.audit.utc_offset_hours)?;
    Ok(AuditContext::new(
        Arc::new(Anonymous),
        Arc::new(clock),
        config.audit.policy(),
    ))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = PersistenceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    db.close().await?;
    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Check connectivity and report the pending migrations and live row counts.
pub async fn run_ping() -> Result<(), Box<dyn std::error::Error>> {
    use crate::repository::entities::{CategoryEntity, ProductEntity};

    let config = PersistenceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;
    db.ping().await?;
    info!("Database reachable");

    let pending = db
        .migration_status()
        .await?
        .into_iter()
        .filter(|(_, applied)| !applied)
        .count();
    if pending > 0 {
        println!("{} pending migration(s)", pending);
    } else {
        let uow = UnitOfWork::with_connection(
            db.get_connection(),
            system_audit_context(&config)?,
            RetryPolicy::from(config.retry),
        );
        let categories = uow.repository::<CategoryEntity>()?.count(&QuerySpec::new()).await?;
        let products = uow.repository::<ProductEntity>()?.count(&QuerySpec::new()).await?;
        println!("categories: {}, products: {}", categories, products);
    }

    db.close().await?;
    Ok(())
}
