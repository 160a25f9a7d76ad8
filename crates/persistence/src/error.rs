//! Translation of store errors into the application taxonomy.

use std::fmt;

use sea_orm::{DbErr, SqlErr};

use common::AppError;

use crate::retry::Transient;

/// What the failing statement was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Insert,
    Update,
    Delete,
    Raw,
    Save,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Read => "read",
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Raw => "raw",
            OperationKind::Save => "save",
        };
        f.write_str(name)
    }
}

/// Context attached to a store call so failures can name the entity and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub entity: &'static str,
    pub key: String,
}

impl Operation {
    pub fn new(kind: OperationKind, entity: &'static str, key: impl Into<String>) -> Self {
        Self {
            kind,
            entity,
            key: key.into(),
        }
    }
}

/// Map a [`DbErr`] into [`AppError`].
///
/// Duplicate keys on insert become `AlreadyExists`, restricted foreign keys
/// on delete become `EntityIsBusy`, any other constraint violation is a
/// `Conflict`. Connection failures that survived the retries become
/// `Persistence`. Everything else passes through untranslated.
pub fn translate(err: DbErr, operation: &Operation) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if operation.kind == OperationKind::Insert {
                AppError::already_exists(operation.entity, &operation.key)
            } else {
                AppError::conflict(format!(
                    "Duplicate value on {} of \"{}\": {}",
                    operation.kind, operation.entity, detail
                ))
            }
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            if operation.kind == OperationKind::Delete {
                AppError::entity_is_busy(operation.entity, &operation.key)
            } else {
                AppError::conflict(format!(
                    "Reference violation on {} of \"{}\": {}",
                    operation.kind, operation.entity, detail
                ))
            }
        }
        _ if err.is_transient() => {
            tracing::error!(
                entity = operation.entity,
                operation = %operation.kind,
                error = %err,
                "Store unavailable, retries exhausted"
            );
            AppError::persistence(err.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_failure_is_persistence() {
        let err = DbErr::Conn(RuntimeErr::Internal("refused".into()));
        let op = Operation::new(OperationKind::Read, "products", "1");

        assert!(matches!(translate(err, &op), AppError::Persistence(_)));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = DbErr::RecordNotFound("gone".into());
        let op = Operation::new(OperationKind::Update, "products", "1");

        assert!(matches!(translate(err, &op), AppError::Database(_)));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(OperationKind::Delete.to_string(), "delete");
        assert_eq!(OperationKind::Save.to_string(), "save");
    }
}
