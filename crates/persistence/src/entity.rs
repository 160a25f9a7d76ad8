//! Entity base contract.
//!
//! Every audited table carries the same six columns: an identity, the
//! creation stamp, the last-modification stamp and the soft-delete flag.
//! Instead of a shared base type, an entity describes where those columns
//! live through an [`EntitySchema`], and the repository and interception
//! code reach them only through that descriptor.

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{ColumnTrait, EntityTrait, IdenStatic, ModelTrait, Value};

/// Column descriptor for the audited base fields of an entity.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema<E: EntityTrait> {
    pub id: E::Column,
    pub created_by: E::Column,
    pub created_at: E::Column,
    pub last_modified_by: E::Column,
    pub last_modified_at: E::Column,
    pub is_deleted: E::Column,
}

impl<E: EntityTrait> EntitySchema<E> {
    /// Identity value of a stored row
    pub fn key_of(&self, model: &E::Model) -> Value {
        model.get(self.id)
    }

    /// Table name, used in logs and error messages
    pub fn table_name(&self) -> &'static str {
        E::default().as_str()
    }

    pub(crate) fn matches_key(&self, key: Value) -> SimpleExpr {
        self.id.eq(key)
    }

    pub(crate) fn matches_keys(&self, keys: Vec<Value>) -> SimpleExpr {
        self.id.is_in(keys)
    }

    pub(crate) fn deleted(&self, flag: bool) -> SimpleExpr {
        self.is_deleted.eq(flag)
    }
}

/// Capability bound for entities handled by the generic repository:
/// has an identity, audit stamps and a soft-delete flag.
///
/// ```ignore
/// impl AuditedEntity for Entity {
///     fn schema() -> EntitySchema<Self> {
///         EntitySchema {
///             id: Column::Id,
///             created_by: Column::CreatedBy,
///             created_at: Column::CreatedAt,
///             last_modified_by: Column::LastModifiedBy,
///             last_modified_at: Column::LastModifiedAt,
///             is_deleted: Column::IsDeleted,
///         }
///     }
/// }
/// ```
pub trait AuditedEntity: EntityTrait {
    fn schema() -> EntitySchema<Self>;
}

/// Render a key value for messages (`7`, `sku-1`, ...)
pub fn display_key(value: &Value) -> String {
    match value {
        Value::TinyInt(Some(v)) => v.to_string(),
        Value::SmallInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::TinyUnsigned(Some(v)) => v.to_string(),
        Value::SmallUnsigned(Some(v)) => v.to_string(),
        Value::Unsigned(Some(v)) => v.to_string(),
        Value::BigUnsigned(Some(v)) => v.to_string(),
        Value::String(Some(v)) => v.to_string(),
        _ => "new".to_string(),
    }
}

/// Render several keys, comma separated
pub fn display_keys(values: &[Value]) -> String {
    values.iter().map(display_key).collect::<Vec<_>>().join(", ")
}
