//! Storage context: the connection, the request's audit inputs, the retry
//! policy and the set of changes staged for the next [`save`](StorageContext::save).

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, IntoActiveModel, TransactionTrait};

use common::{AppError, AppResult};
use domain::{AuditContext, AuditStamp, ChangeKind};

use crate::changes;
use crate::entity::{display_key, AuditedEntity};
use crate::error::{translate, Operation, OperationKind};
use crate::raw::RawQuery;
use crate::repository::GenericRepository;
use crate::retry::{RetryPolicy, Transient};

type ApplyFn = Box<
    dyn for<'t> Fn(&'t DatabaseTransaction, &'t AuditStamp) -> BoxFuture<'t, Result<u64, DbErr>>
        + Send
        + Sync,
>;

fn apply_fn<F>(f: F) -> ApplyFn
where
    F: for<'t> Fn(&'t DatabaseTransaction, &'t AuditStamp) -> BoxFuture<'t, Result<u64, DbErr>>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

/// One change waiting for the next save.
pub struct StagedChange {
    kind: ChangeKind,
    operation: Operation,
    apply: ApplyFn,
}

impl fmt::Debug for StagedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedChange")
            .field("kind", &self.kind)
            .field("operation", &self.operation)
            .finish()
    }
}

impl StagedChange {
    pub fn insert<E>(active: E::ActiveModel) -> Self
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel>,
        E::ActiveModel: Send + Sync,
    {
        let operation = Operation::new(
            OperationKind::Insert,
            E::schema().table_name(),
            changes::pending_key::<E>(&active),
        );
        Self {
            kind: ChangeKind::Insert,
            operation,
            apply: apply_fn(move |txn, stamp| {
                let prepared = changes::insert_model::<E>(&active, stamp);
                Box::pin(async move { E::insert(prepared).exec_without_returning(txn).await })
            }),
        }
    }

    pub fn update<E>(model: E::Model) -> Self
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    {
        let schema = E::schema();
        let operation = Operation::new(
            OperationKind::Update,
            schema.table_name(),
            display_key(&schema.key_of(&model)),
        );
        Self {
            kind: ChangeKind::Update,
            operation,
            apply: apply_fn(move |txn, stamp| {
                let statement = changes::update_statement::<E>(&model, stamp);
                Box::pin(async move { Ok(statement.exec(txn).await?.rows_affected) })
            }),
        }
    }

    /// Staged deletion of an audited row, written as a flag update.
    pub fn soft_delete<E>(model: &E::Model) -> Self
    where
        E: AuditedEntity + 'static,
    {
        let schema = E::schema();
        let key = schema.key_of(model);
        let operation = Operation::new(OperationKind::Update, schema.table_name(), display_key(&key));
        Self {
            kind: ChangeKind::Delete,
            operation,
            apply: apply_fn(move |txn, stamp| {
                let statement = changes::soft_delete_statement::<E>(vec![key.clone()], stamp);
                Box::pin(async move { Ok(statement.exec(txn).await?.rows_affected) })
            }),
        }
    }

    /// Staged physical removal.
    pub fn remove<E>(model: &E::Model) -> Self
    where
        E: AuditedEntity + 'static,
    {
        let schema = E::schema();
        let key = schema.key_of(model);
        let operation = Operation::new(OperationKind::Delete, schema.table_name(), display_key(&key));
        Self {
            kind: ChangeKind::Delete,
            operation,
            apply: apply_fn(move |txn, _stamp| {
                let statement = changes::delete_statement::<E>(vec![key.clone()]);
                Box::pin(async move { Ok(statement.exec(txn).await?.rows_affected) })
            }),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// A staged change failed; `position` is `None` for begin/commit.
struct SaveFailure {
    position: Option<usize>,
    source: DbErr,
}

impl From<DbErr> for SaveFailure {
    fn from(source: DbErr) -> Self {
        Self {
            position: None,
            source,
        }
    }
}

impl Transient for SaveFailure {
    fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

impl fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

/// Connection, audit inputs, retry policy and staged changes for one request.
pub struct StorageContext {
    connection: DatabaseConnection,
    audit: AuditContext,
    retry: RetryPolicy,
    staged: Mutex<Vec<StagedChange>>,
}

impl fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageContext")
            .field("audit", &self.audit)
            .field("retry", &self.retry)
            .field("pending", &self.pending())
            .finish()
    }
}

impl StorageContext {
    pub fn new(connection: DatabaseConnection, audit: AuditContext, retry: RetryPolicy) -> Self {
        Self {
            connection,
            audit,
            retry,
            staged: Mutex::new(Vec::new()),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn audit(&self) -> &AuditContext {
        &self.audit
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Auto-committing repository for `E`.
    pub fn repository<E>(&self) -> GenericRepository<'_, E, DatabaseConnection>
    where
        E: AuditedEntity + 'static,
        E::Model: IntoActiveModel<E::ActiveModel> + Sync,
        E::ActiveModel: Send + Sync,
    {
        GenericRepository::new(&self.connection, &self.audit, Some(&self.retry))
    }

    /// Raw statement handle on the pooled connection.
    pub fn raw(&self) -> RawQuery<'_, DatabaseConnection> {
        RawQuery::new(&self.connection, Some(&self.retry))
    }

    fn staged(&self) -> MutexGuard<'_, Vec<StagedChange>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stage(&self, change: StagedChange) {
        tracing::debug!(
            entity = change.operation.entity,
            kind = %change.kind,
            key = %change.operation.key,
            "Change staged"
        );
        self.staged().push(change);
    }

    /// Number of staged changes.
    pub fn pending(&self) -> usize {
        self.staged().len()
    }

    /// Drop every staged change; returns how many there were.
    pub fn discard(&self) -> usize {
        let mut staged = self.staged();
        let count = staged.len();
        staged.clear();
        count
    }

    /// Write every staged change in one transaction.
    ///
    /// Stamps are resolved before anything is written, so a missing actor
    /// fails the save without touching the store. On failure the changes
    /// stay staged. Returns the number of rows written, `0` when nothing
    /// was staged.
    pub async fn save(&self) -> AppResult<u64> {
        let batch = std::mem::take(&mut *self.staged());
        if batch.is_empty() {
            return Ok(0);
        }

        let result = self.flush(&batch).await;
        match &result {
            Ok(rows) => {
                tracing::debug!(changes = batch.len(), rows, "Staged changes saved");
            }
            Err(err) => {
                tracing::debug!(changes = batch.len(), error = %err, "Save failed, changes kept");
                let mut staged = self.staged();
                let newer = std::mem::take(&mut *staged);
                *staged = batch;
                staged.extend(newer);
            }
        }
        result
    }

    async fn flush(&self, batch: &[StagedChange]) -> AppResult<u64> {
        let stamps = batch
            .iter()
            .map(|change| self.audit.stamp(change.kind))
            .collect::<Result<Vec<AuditStamp>, _>>()
            .map_err(AppError::from)?;

        let conn = &self.connection;
        let stamps = &stamps;
        let attempt = move || async move {
            let txn = conn.begin().await?;
            let mut rows = 0;
            for (position, (change, stamp)) in batch.iter().zip(stamps).enumerate() {
                rows += (change.apply)(&txn, stamp).await.map_err(|source| SaveFailure {
                    position: Some(position),
                    source,
                })?;
            }
            txn.commit().await?;
            Ok::<u64, SaveFailure>(rows)
        };

        self.retry.run("save", attempt).await.map_err(|failure| {
            let operation = failure
                .position
                .and_then(|position| batch.get(position))
                .map(|change| change.operation.clone())
                .unwrap_or_else(|| Operation::new(OperationKind::Save, "staged changes", "-"));
            translate(failure.source, &operation)
        })
    }
}
