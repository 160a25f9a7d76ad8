//! Raw statements: literal SQL or stored procedure calls, run outside the
//! entity API.
//!
//! Every call takes an optional ambient transaction and a cancellation
//! token. Cancelling stops waiting on the store and yields
//! [`AppError::Cancelled`]; the statement itself is dropped with the future.

use std::future::Future;

use sea_orm::{
    ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, ExecResult, FromQueryResult,
    QueryResult, Statement, TransactionTrait, TryGetable, Value,
};
use tokio_util::sync::CancellationToken;

use common::{AppError, AppResult};

use crate::error::{translate, Operation, OperationKind};
use crate::retry::RetryPolicy;

/// How the statement text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Literal SQL with backend placeholders
    Text,
    /// Name of a stored procedure; arguments come from the parameters
    StoredProcedure,
}

/// Whether the caller expects rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Execute,
    Rows,
}

/// A statement identifier plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommand {
    sql: String,
    params: Vec<Value>,
    kind: CommandKind,
}

impl RawCommand {
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            kind: CommandKind::Text,
        }
    }

    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            sql: name.into(),
            params: Vec::new(),
            kind: CommandKind::StoredProcedure,
        }
    }

    /// Append a positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render for a backend.
    ///
    /// Procedures become `SELECT * FROM name($1, ..)` (rows) or
    /// `CALL name($1, ..)` on Postgres and `CALL name(?, ..)` on MySQL.
    /// SQLite has no stored procedures.
    pub fn to_statement(&self, backend: DbBackend, shape: Shape) -> AppResult<Statement> {
        let sql = match self.kind {
            CommandKind::Text => self.sql.clone(),
            CommandKind::StoredProcedure => self.procedure_call(backend, shape)?,
        };
        Ok(Statement::from_sql_and_values(backend, sql, self.params.clone()))
    }

    fn procedure_call(&self, backend: DbBackend, shape: Shape) -> AppResult<String> {
        let name = self.sql.trim();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(AppError::validation(format!("Invalid procedure name '{}'", name)));
        }

        let count = self.params.len();
        match backend {
            DbBackend::Postgres => {
                let args = (1..=count)
                    .map(|i| format!("${}", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(match shape {
                    Shape::Rows => format!("SELECT * FROM {}({})", name, args),
                    Shape::Execute => format!("CALL {}({})", name, args),
                })
            }
            DbBackend::MySql => Ok(format!("CALL {}({})", name, vec!["?"; count].join(", "))),
            DbBackend::Sqlite => Err(AppError::validation(
                "Stored procedures are not supported on SQLite",
            )),
        }
    }
}

/// Where a raw statement runs.
enum Executor<'a, C> {
    Ambient(&'a DatabaseTransaction),
    Own(&'a C),
}

impl<C: ConnectionTrait> Executor<'_, C> {
    async fn execute(&self, statement: Statement) -> Result<ExecResult, DbErr> {
        match self {
            Executor::Ambient(txn) => txn.execute(statement).await,
            Executor::Own(conn) => conn.execute(statement).await,
        }
    }

    async fn query_one(&self, statement: Statement) -> Result<Option<QueryResult>, DbErr> {
        match self {
            Executor::Ambient(txn) => txn.query_one(statement).await,
            Executor::Own(conn) => conn.query_one(statement).await,
        }
    }

    async fn query_all(&self, statement: Statement) -> Result<Vec<QueryResult>, DbErr> {
        match self {
            Executor::Ambient(txn) => txn.query_all(statement).await,
            Executor::Own(conn) => conn.query_all(statement).await,
        }
    }

    fn is_ambient(&self) -> bool {
        matches!(self, Executor::Ambient(_))
    }
}

fn decode<T: FromQueryResult>(rows: &[QueryResult]) -> Result<Vec<T>, DbErr> {
    rows.iter().map(|row| T::from_query_result(row, "")).collect()
}

/// Raw statement handle bound to an executor.
pub struct RawQuery<'c, C> {
    conn: &'c C,
    retry: Option<&'c RetryPolicy>,
}

impl<'c, C: ConnectionTrait> RawQuery<'c, C> {
    pub fn new(conn: &'c C, retry: Option<&'c RetryPolicy>) -> Self {
        Self { conn, retry }
    }

    pub fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    fn executor<'a>(&'a self, tx: Option<&'a DatabaseTransaction>) -> Executor<'a, C> {
        match tx {
            Some(txn) => Executor::Ambient(txn),
            None => Executor::Own(self.conn),
        }
    }

    fn operation(command: &RawCommand) -> Operation {
        Operation::new(OperationKind::Raw, "raw", command.sql())
    }

    /// Run `attempt` until done or cancelled. Statements on an ambient
    /// transaction are never retried.
    async fn guarded<T, F, Fut>(
        &self,
        command: &RawCommand,
        retryable: bool,
        cancel: &CancellationToken,
        attempt: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let work = async {
            match self.retry {
                Some(policy) if retryable => policy.run("raw", attempt).await,
                _ => {
                    let mut attempt = attempt;
                    attempt().await
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(sql = command.sql(), "Raw statement cancelled");
                Err(AppError::Cancelled)
            }
            result = work => result.map_err(|err| translate(err, &Self::operation(command))),
        }
    }

    /// Run a statement; returns affected rows.
    pub async fn execute(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<u64> {
        let statement = command.to_statement(self.backend(), Shape::Execute)?;
        let executor = self.executor(tx);
        let (statement, executor) = (&statement, &executor);

        let result = self
            .guarded(command, !executor.is_ambient(), cancel, move || async move {
                executor.execute(statement.clone()).await
            })
            .await?;
        Ok(result.rows_affected())
    }

    /// First column of the first row, `None` when there are no rows.
    pub async fn scalar<T: TryGetable>(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Option<T>> {
        let row = self.query_row(command, tx, cancel).await?;
        row.map(|row| row.try_get_by_index::<T>(0))
            .transpose()
            .map_err(|err| translate(err, &Self::operation(command)))
    }

    /// Every row, decoded as `T`.
    pub async fn query<T: FromQueryResult>(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<T>> {
        let rows = self.query_rows(command, tx, cancel).await?;
        decode(&rows).map_err(|err| translate(err, &Self::operation(command)))
    }

    /// First row, if any.
    pub async fn query_first<T: FromQueryResult>(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Option<T>> {
        let row = self.query_row(command, tx, cancel).await?;
        row.map(|row| T::from_query_result(&row, ""))
            .transpose()
            .map_err(|err| translate(err, &Self::operation(command)))
    }

    /// The only row, if any; more than one row is a validation error.
    pub async fn query_single<T: FromQueryResult>(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Option<T>> {
        let rows = self.query_rows(command, tx, cancel).await?;
        if rows.len() > 1 {
            return Err(AppError::validation(format!(
                "Expected at most one row, got {}",
                rows.len()
            )));
        }
        Ok(decode(&rows)
            .map_err(|err| translate(err, &Self::operation(command)))?
            .pop())
    }

    async fn query_row(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Option<QueryResult>> {
        let statement = command.to_statement(self.backend(), Shape::Rows)?;
        let executor = self.executor(tx);
        let (statement, executor) = (&statement, &executor);

        self.guarded(command, !executor.is_ambient(), cancel, move || async move {
            executor.query_one(statement.clone()).await
        })
        .await
    }

    async fn query_rows(
        &self,
        command: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<QueryResult>> {
        let statement = command.to_statement(self.backend(), Shape::Rows)?;
        let executor = self.executor(tx);
        let (statement, executor) = (&statement, &executor);

        self.guarded(command, !executor.is_ambient(), cancel, move || async move {
            executor.query_all(statement.clone()).await
        })
        .await
    }
}

impl<'c, C: ConnectionTrait + TransactionTrait> RawQuery<'c, C> {
    /// Two row sets from two statements, read on one transaction: the
    /// ambient one, or a short one opened for the call.
    pub async fn query_multiple<T1, T2>(
        &self,
        first: &RawCommand,
        second: &RawCommand,
        tx: Option<&DatabaseTransaction>,
        cancel: &CancellationToken,
    ) -> AppResult<(Vec<T1>, Vec<T2>)>
    where
        T1: FromQueryResult,
        T2: FromQueryResult,
    {
        let backend = self.backend();
        let first_statement = first.to_statement(backend, Shape::Rows)?;
        let second_statement = second.to_statement(backend, Shape::Rows)?;
        let (first_statement, second_statement) = (&first_statement, &second_statement);
        let conn = self.conn;

        let (first_rows, second_rows) = match tx {
            Some(txn) => {
                self.guarded(first, false, cancel, move || async move {
                    let first_rows = txn.query_all(first_statement.clone()).await?;
                    let second_rows = txn.query_all(second_statement.clone()).await?;
                    Ok((first_rows, second_rows))
                })
                .await?
            }
            None => {
                self.guarded(first, true, cancel, move || async move {
                    let txn = conn.begin().await?;
                    let first_rows = txn.query_all(first_statement.clone()).await?;
                    let second_rows = txn.query_all(second_statement.clone()).await?;
                    txn.commit().await?;
                    Ok((first_rows, second_rows))
                })
                .await?
            }
        };

        let first_set = decode::<T1>(&first_rows).map_err(|err| translate(err, &Self::operation(first)))?;
        let second_set = decode::<T2>(&second_rows).map_err(|err| translate(err, &Self::operation(second)))?;
        Ok((first_set, second_set))
    }
}
