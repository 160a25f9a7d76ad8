//! Unit of Work pattern implementation.
//!
//! One unit of work per request. It owns the [`StorageContext`] and
//! coordinates:
//! - auto-committing repositories and the raw statement handle
//! - the deferred surface: staged changes written by [`UnitOfWork::save`]
//! - closure-scoped transactions (commit on `Ok`, rollback on `Err`)
//!
//! Disposing releases the connection handle and discards whatever is still
//! staged. It happens at most once, and also on drop.

use std::pin::Pin;

use chrono::NaiveDateTime;
use futures::Future;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IntoActiveModel, IsolationLevel,
    TransactionTrait,
};

use common::{AppError, AppResult};
use domain::AuditContext;

use crate::context::{StagedChange, StorageContext};
use crate::entity::AuditedEntity;
use crate::error::{translate, Operation, OperationKind};
use crate::raw::RawQuery;
use crate::repository::GenericRepository;
use crate::retry::RetryPolicy;

/// Transaction context providing repository access within a transaction.
///
/// Everything done through this context is part of the same database
/// transaction. Writes issued here run as savepoints and are not retried.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
    audit: &'a AuditContext,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction, audit: &'a AuditContext) -> Self {
        Self { txn, audit }
    }

    /// Repository for `E` bound to this transaction
    pub fn repository<E>(&self) -> GenericRepository<'a, E, DatabaseTransaction>
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: Send + Sync,
    {
        GenericRepository::new(self.txn, self.audit, None)
    }

    /// Raw statement handle bound to this transaction
    pub fn raw(&self) -> RawQuery<'a, DatabaseTransaction> {
        RawQuery::new(self.txn, None)
    }

    /// The underlying transaction, for ambient raw statements
    pub fn transaction(&self) -> &'a DatabaseTransaction {
        self.txn
    }
}

/// Request-scoped unit of work over one [`StorageContext`].
#[derive(Debug)]
pub struct UnitOfWork {
    context: Option<StorageContext>,
}

impl UnitOfWork {
    pub fn new(context: StorageContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Build the storage context from its parts
    pub fn with_connection(connection: DatabaseConnection, audit: AuditContext, retry: RetryPolicy) -> Self {
        Self::new(StorageContext::new(connection, audit, retry))
    }

    fn context(&self) -> AppResult<&StorageContext> {
        self.context
            .as_ref()
            .ok_or_else(|| AppError::validation("The unit of work has been disposed"))
    }

    pub fn is_disposed(&self) -> bool {
        self.context.is_none()
    }

    /// Auto-committing repository for `E`
    pub fn repository<E>(&self) -> AppResult<GenericRepository<'_, E, DatabaseConnection>>
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: Send + Sync,
    {
        Ok(self.context()?.repository::<E>())
    }

    /// Raw statement handle on the pooled connection
    pub fn raw(&self) -> AppResult<RawQuery<'_, DatabaseConnection>> {
        Ok(self.context()?.raw())
    }

    // =========================================================================
    // Deferred surface
    // =========================================================================

    pub fn stage_insert<E>(&self, active: E::ActiveModel) -> AppResult<()>
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel>,
        E::ActiveModel: Send + Sync,
    {
        self.context()?.stage(StagedChange::insert::<E>(active));
        Ok(())
    }

    pub fn stage_update<E>(&self, model: E::Model) -> AppResult<()>
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    {
        self.context()?.stage(StagedChange::update::<E>(model));
        Ok(())
    }

    /// Stage a deletion; it is written as a soft delete.
    pub fn stage_soft_delete<E>(&self, model: &E::Model) -> AppResult<()>
    where
        E: AuditedEntity + 'static,
    {
        self.context()?.stage(StagedChange::soft_delete::<E>(model));
        Ok(())
    }

    /// Stage a physical removal.
    pub fn stage_remove<E>(&self, model: &E::Model) -> AppResult<()>
    where
        E: AuditedEntity + 'static,
    {
        self.context()?.stage(StagedChange::remove::<E>(model));
        Ok(())
    }

    /// Number of changes waiting for [`save`](Self::save)
    pub fn pending(&self) -> usize {
        self.context.as_ref().map_or(0, StorageContext::pending)
    }

    /// Write all staged changes in one transaction; returns rows written.
    pub async fn save(&self) -> AppResult<u64> {
        self.context()?.save().await
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Execute a closure within a transaction.
    ///
    /// The transaction is automatically committed on success or rolled back on error.
    /// Uses ReadCommitted isolation level by default for balanced consistency/performance.
    pub async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f).await
    }

    /// Execute a closure within a transaction with serializable isolation.
    pub async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::Serializable, f).await
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        let context = self.context()?;
        let txn = self.begin_with(Some(isolation)).await?;

        let ctx = TransactionContext::new(&txn, context.audit());

        match f(ctx).await {
            Ok(result) => {
                txn.commit()
                    .await
                    .map_err(|err| translate(err, &Self::transaction_operation()))?;
                tracing::debug!("Transaction committed");
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                } else {
                    tracing::debug!(error = %e, "Transaction rolled back");
                }
                Err(e)
            }
        }
    }

    /// Open a transaction the caller manages; dropping it uncommitted rolls back.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.begin_with(None).await
    }

    async fn begin_with(&self, isolation: Option<IsolationLevel>) -> AppResult<DatabaseTransaction> {
        let context = self.context()?;
        let connection = context.connection();

        context
            .retry()
            .run("begin", move || {
                connection.begin_with_config(isolation.clone(), Some(AccessMode::ReadWrite))
            })
            .await
            .map_err(|err| translate(err, &Self::transaction_operation()))
    }

    fn transaction_operation() -> Operation {
        Operation::new(OperationKind::Save, "transaction", "-")
    }

    /// Convert a US Eastern wall-clock time into local (Cairo) time.
    pub fn convert_to_local_date(&self, eastern: NaiveDateTime) -> AppResult<NaiveDateTime> {
        Ok(domain::convert_to_local_date(eastern)?)
    }

    /// Release the connection handle and discard staged changes.
    /// Later calls are no-ops; later operations fail with a validation error.
    pub fn dispose(&mut self) {
        if let Some(context) = self.context.take() {
            let discarded = context.discard();
            if discarded > 0 {
                tracing::warn!(discarded, "Unit of work disposed with unsaved changes");
            }
            tracing::debug!("Unit of work disposed");
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.dispose();
    }
}
