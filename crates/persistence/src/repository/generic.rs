//! Generic repository over any audited entity.
//!
//! Reads never see soft-deleted rows unless the [`QuerySpec`] opts in.
//! Every write runs the audit interception and commits in its own
//! transaction; when the executor is already a transaction the write
//! becomes a savepoint inside it.

use std::future::Future;

use futures::future::BoxFuture;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QuerySelect, Select, SelectModel, Selector,
    TransactionTrait, Value,
};

use common::{AppError, AppResult, Page};
use domain::{AuditContext, ChangeKind};

use crate::changes;
use crate::entity::{display_keys, AuditedEntity, EntitySchema};
use crate::error::{translate, Operation, OperationKind};
use crate::query::{Projection, QuerySpec};
use crate::raw::RawQuery;
use crate::retry::RetryPolicy;

/// Repository for entity `E` running on executor `C`, a pooled
/// connection or an open transaction.
pub struct GenericRepository<'c, E: AuditedEntity, C> {
    conn: &'c C,
    audit: &'c AuditContext,
    retry: Option<&'c RetryPolicy>,
    schema: EntitySchema<E>,
}

impl<'c, E, C> GenericRepository<'c, E, C>
where
    E: AuditedEntity + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send + Sync,
    C: ConnectionTrait + TransactionTrait,
{
    /// `retry` is `None` for executors that must not be retried, such as
    /// a transaction owned by the caller.
    pub fn new(conn: &'c C, audit: &'c AuditContext, retry: Option<&'c RetryPolicy>) -> Self {
        Self {
            conn,
            audit,
            retry,
            schema: E::schema(),
        }
    }

    pub fn schema(&self) -> &EntitySchema<E> {
        &self.schema
    }

    pub fn entity_name(&self) -> &'static str {
        self.schema.table_name()
    }

    fn operation(&self, kind: OperationKind, key: impl Into<String>) -> Operation {
        Operation::new(kind, self.entity_name(), key)
    }

    async fn read<T, F, Fut>(&self, attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let result = match self.retry {
            Some(policy) => policy.run(self.entity_name(), attempt).await,
            None => {
                let mut attempt = attempt;
                attempt().await
            }
        };
        result.map_err(|err| translate(err, &self.operation(OperationKind::Read, "-")))
    }

    async fn write<T, F>(&self, operation: Operation, change: F) -> AppResult<T>
    where
        T: Send,
        F: for<'t> Fn(&'t DatabaseTransaction) -> BoxFuture<'t, Result<T, DbErr>> + Send + Sync,
    {
        let conn = self.conn;
        let change = &change;
        let attempt = move || async move {
            let txn = conn.begin().await?;
            let value = change(&txn).await?;
            txn.commit().await?;
            Ok::<T, DbErr>(value)
        };

        let result = match self.retry {
            Some(policy) => policy.run(operation.entity, attempt).await,
            None => attempt().await,
        };

        match result {
            Ok(value) => {
                tracing::debug!(
                    entity = operation.entity,
                    operation = %operation.kind,
                    key = %operation.key,
                    "Committed"
                );
                Ok(value)
            }
            Err(err) => Err(translate(err, &operation)),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Deferred query over `E` with the spec applied.
    pub fn query(&self, spec: &QuerySpec<E>) -> Select<E> {
        spec.apply(&self.schema, E::find())
    }

    /// Deferred projected query; compose further or execute on any connection.
    pub fn get_all_query<R>(&self, projection: &Projection<E, R>, spec: &QuerySpec<E>) -> Selector<SelectModel<R>>
    where
        R: FromQueryResult,
    {
        projection.apply(self.query(spec))
    }

    /// Row with the given identity, or `None`.
    pub async fn get_by_id<R, K>(
        &self,
        projection: &Projection<E, R>,
        id: K,
        spec: &QuerySpec<E>,
    ) -> AppResult<Option<R>>
    where
        R: FromQueryResult + Send,
        K: Into<Value>,
    {
        let select = self.query(spec).filter(self.schema.matches_key(id.into()));
        let select = &select;
        let conn = self.conn;

        self.read(move || async move { projection.apply(select.clone()).one(conn).await })
            .await
    }

    /// Whether any row matches. Stops at the first one.
    pub async fn exists(&self, spec: &QuerySpec<E>) -> AppResult<bool> {
        let select = self
            .query(spec)
            .select_only()
            .expr_as(Expr::value(1), "present")
            .limit(1);
        let select = &select;
        let conn = self.conn;

        let found = self
            .read(move || async move { select.clone().into_tuple::<i32>().one(conn).await })
            .await?;
        Ok(found.is_some())
    }

    /// First row by the spec's order (store order when unordered).
    pub async fn get_one<R>(&self, projection: &Projection<E, R>, spec: &QuerySpec<E>) -> AppResult<Option<R>>
    where
        R: FromQueryResult + Send,
    {
        let select = self.query(spec);
        let select = &select;
        let conn = self.conn;

        self.read(move || async move { projection.apply(select.clone()).one(conn).await })
            .await
    }

    /// One page of rows plus the total count. `page_number` is 1-based.
    ///
    /// Paging without an order in the spec is allowed, but then which rows
    /// land on which page is up to the store.
    pub async fn get_page<R>(
        &self,
        projection: &Projection<E, R>,
        page_number: u64,
        page_size: u64,
        spec: &QuerySpec<E>,
    ) -> AppResult<Page<R>>
    where
        R: FromQueryResult + Send,
    {
        if page_number < 1 {
            return Err(AppError::validation("Page number must be at least 1"));
        }
        if page_size < 1 {
            return Err(AppError::validation("Page size must be at least 1"));
        }
        if !spec.is_ordered() {
            tracing::debug!(
                entity = self.entity_name(),
                "Paging without an order, page contents depend on store order"
            );
        }

        let offset = (page_number - 1)
            .checked_mul(page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| AppError::validation("Page number is out of range"))?;

        let total_count = self.count(spec).await?;

        let window = self.query(spec).offset(offset).limit(page_size);
        let window = &window;
        let conn = self.conn;

        let items = self
            .read(move || async move { projection.apply(window.clone()).all(conn).await })
            .await?;

        Ok(Page::new(items, page_number, page_size, total_count))
    }

    /// Every matching row.
    pub async fn get_all<R>(&self, projection: &Projection<E, R>, spec: &QuerySpec<E>) -> AppResult<Vec<R>>
    where
        R: FromQueryResult + Send,
    {
        let select = self.query(spec);
        let select = &select;
        let conn = self.conn;

        self.read(move || async move { projection.apply(select.clone()).all(conn).await })
            .await
    }

    /// Number of matching rows within the spec's deleted-row scope.
    pub async fn count(&self, spec: &QuerySpec<E>) -> AppResult<u64> {
        let select = self.query(spec);
        let select = &select;
        let conn = self.conn;

        self.read(move || async move { PaginatorTrait::count(select.clone(), conn).await })
            .await
    }

    /// Passthrough statements on the same executor.
    pub fn raw(&self) -> RawQuery<'c, C> {
        RawQuery::new(self.conn, self.retry)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stamp and insert one row; returns it with its identity and stamps.
    pub async fn add(&self, active: E::ActiveModel) -> AppResult<E::Model> {
        let stamp = self.audit.stamp(ChangeKind::Insert)?;
        let prepared = changes::insert_model::<E>(&active, &stamp);
        let operation = self.operation(OperationKind::Insert, changes::pending_key::<E>(&prepared));

        self.write(operation, move |txn| {
            let active = prepared.clone();
            Box::pin(async move { active.insert(txn).await })
        })
        .await
    }

    /// Stamp and insert several rows in one transaction.
    pub async fn add_many(&self, actives: Vec<E::ActiveModel>) -> AppResult<Vec<E::Model>> {
        if actives.is_empty() {
            return Ok(Vec::new());
        }

        let stamp = self.audit.stamp(ChangeKind::Insert)?;
        let prepared: Vec<E::ActiveModel> = actives
            .iter()
            .map(|active| changes::insert_model::<E>(active, &stamp))
            .collect();
        let keys: Vec<String> = prepared.iter().map(changes::pending_key::<E>).collect();
        let operation = self.operation(OperationKind::Insert, keys.join(", "));

        self.write(operation, move |txn| {
            let batch = prepared.clone();
            Box::pin(async move {
                let mut stored = Vec::with_capacity(batch.len());
                for active in batch {
                    stored.push(active.insert(txn).await?);
                }
                Ok(stored)
            })
        })
        .await
    }

    /// Write the whole row back and re-stamp it; returns affected rows.
    pub async fn update(&self, model: &E::Model) -> AppResult<u64> {
        self.update_many(std::slice::from_ref(model)).await
    }

    pub async fn update_many(&self, models: &[E::Model]) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        let stamp = self.audit.stamp(ChangeKind::Update)?;
        let operation = self.operation(OperationKind::Update, display_keys(&self.keys(models)));
        let stamp = &stamp;

        self.write(operation, move |txn| {
            let statements: Vec<_> = models
                .iter()
                .map(|model| changes::update_statement::<E>(model, stamp))
                .collect();
            Box::pin(async move {
                let mut rows = 0;
                for statement in statements {
                    rows += statement.exec(txn).await?.rows_affected;
                }
                Ok(rows)
            })
        })
        .await
    }

    /// Flag a row as deleted and re-stamp it; returns affected rows.
    pub async fn soft_delete(&self, model: &E::Model) -> AppResult<u64> {
        self.soft_delete_many(std::slice::from_ref(model)).await
    }

    pub async fn soft_delete_many(&self, models: &[E::Model]) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        let stamp = self.audit.stamp(ChangeKind::Delete)?;
        let keys = self.keys(models);
        let operation = self.operation(OperationKind::Update, display_keys(&keys));

        self.write(operation, move |txn| {
            let statement = changes::soft_delete_statement::<E>(keys.clone(), &stamp);
            Box::pin(async move { Ok(statement.exec(txn).await?.rows_affected) })
        })
        .await
    }

    /// Bring a soft-deleted row back; returns affected rows.
    pub async fn restore(&self, model: &E::Model) -> AppResult<u64> {
        let stamp = self.audit.stamp(ChangeKind::Update)?;
        let keys = self.keys(std::slice::from_ref(model));
        let operation = self.operation(OperationKind::Update, display_keys(&keys));

        self.write(operation, move |txn| {
            let statement = changes::restore_statement::<E>(keys.clone(), &stamp);
            Box::pin(async move { Ok(statement.exec(txn).await?.rows_affected) })
        })
        .await
    }

    /// Physically remove a row. Rows still referenced through a
    /// restricting foreign key fail with `EntityIsBusy`.
    pub async fn delete(&self, model: &E::Model) -> AppResult<u64> {
        self.delete_many(std::slice::from_ref(model)).await
    }

    /// Physically remove rows one by one in a single transaction.
    pub async fn delete_many(&self, models: &[E::Model]) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        let keys = self.keys(models);
        let operation = self.operation(OperationKind::Delete, display_keys(&keys));

        self.write(operation, move |txn| {
            let statements: Vec<_> = keys
                .iter()
                .map(|key| changes::delete_statement::<E>(vec![key.clone()]))
                .collect();
            Box::pin(async move {
                let mut rows = 0;
                for statement in statements {
                    rows += statement.exec(txn).await?.rows_affected;
                }
                Ok(rows)
            })
        })
        .await
    }

    /// Same as [`update_many`](Self::update_many) without the count.
    pub async fn bulk_update(&self, models: &[E::Model]) -> AppResult<()> {
        self.update_many(models).await.map(|_| ())
    }

    /// Physically remove rows with a single `DELETE ... WHERE id IN (...)`.
    pub async fn bulk_delete(&self, models: &[E::Model]) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        let keys = self.keys(models);
        let operation = self.operation(OperationKind::Delete, display_keys(&keys));

        self.write(operation, move |txn| {
            let statement = changes::delete_statement::<E>(keys.clone());
            Box::pin(async move {
                statement.exec(txn).await?;
                Ok(())
            })
        })
        .await
    }

    fn keys(&self, models: &[E::Model]) -> Vec<Value> {
        models.iter().map(|model| self.schema.key_of(model)).collect()
    }
}
