//! Write statements shared by auto-committing repository writes and
//! staged unit-of-work changes. Each one runs the audit interception
//! before the statement is built.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DeleteMany, EntityTrait, IntoActiveModel, QueryFilter,
    UpdateMany, Value,
};

use domain::AuditStamp;

use crate::audit::{mark_deleted, mark_restored, stamp_insert, stamp_update};
use crate::entity::AuditedEntity;

/// Stamped copy of a row to insert.
pub fn insert_model<E: AuditedEntity>(active: &E::ActiveModel, stamp: &AuditStamp) -> E::ActiveModel {
    let mut active = active.clone();
    stamp_insert(&E::schema(), &mut active, stamp);
    active
}

/// Whole-row update of one stored row. Every column except the identity
/// and the creation stamp is written.
pub fn update_statement<E>(model: &E::Model, stamp: &AuditStamp) -> UpdateMany<E>
where
    E: AuditedEntity,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let schema = E::schema();
    let key = schema.key_of(model);
    let mut active = model.clone().into_active_model().reset_all();
    stamp_update(&schema, &mut active, stamp);

    E::update_many().set(active).filter(schema.matches_key(key))
}

/// Soft delete: flag the live rows among `keys` and re-stamp them.
pub fn soft_delete_statement<E: AuditedEntity>(keys: Vec<Value>, stamp: &AuditStamp) -> UpdateMany<E> {
    let schema = E::schema();
    let mut active = <E::ActiveModel as ActiveModelBehavior>::new();
    mark_deleted(&schema, &mut active, stamp);

    E::update_many()
        .set(active)
        .filter(schema.matches_keys(keys))
        .filter(schema.deleted(false))
}

/// Clear the soft-delete flag on the deleted rows among `keys`.
pub fn restore_statement<E: AuditedEntity>(keys: Vec<Value>, stamp: &AuditStamp) -> UpdateMany<E> {
    let schema = E::schema();
    let mut active = <E::ActiveModel as ActiveModelBehavior>::new();
    mark_restored(&schema, &mut active, stamp);

    E::update_many()
        .set(active)
        .filter(schema.matches_keys(keys))
        .filter(schema.deleted(true))
}

/// Physical removal of `keys`.
pub fn delete_statement<E: AuditedEntity>(keys: Vec<Value>) -> DeleteMany<E> {
    E::delete_many().filter(E::schema().matches_keys(keys))
}

/// Identity of a row about to be inserted, `new` when the store assigns it.
pub fn pending_key<E: AuditedEntity>(active: &E::ActiveModel) -> String {
    active
        .get(E::schema().id)
        .into_value()
        .map(|value| crate::entity::display_key(&value))
        .unwrap_or_else(|| "new".to_string())
}
