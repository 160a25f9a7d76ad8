//! Write interception.
//!
//! Plain functions run on an active model immediately before it is written.
//! They only touch the audited columns named by the entity's
//! [`EntitySchema`]; the stamp is always passed in explicitly.

use sea_orm::{ActiveModelTrait, EntityTrait, Value};

use domain::AuditStamp;

use crate::entity::EntitySchema;

/// Stamp a row about to be inserted.
///
/// Sets `created_at`/`created_by`, clears the modification stamp and
/// defaults the soft-delete flag to `false` unless the caller set it.
pub fn stamp_insert<E, A>(schema: &EntitySchema<E>, active: &mut A, stamp: &AuditStamp)
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    active.set(schema.created_by, Value::from(stamp.actor.clone()));
    active.set(schema.created_at, Value::from(stamp.at));
    active.set(schema.last_modified_by, Value::String(None));
    active.set(schema.last_modified_at, Value::ChronoDateTimeWithTimeZone(None));

    if active.get(schema.is_deleted).into_value().is_none() {
        active.set(schema.is_deleted, Value::from(false));
    }
}

/// Stamp a row about to be updated.
///
/// The creation stamp and the identity are never part of an update.
pub fn stamp_update<E, A>(schema: &EntitySchema<E>, active: &mut A, stamp: &AuditStamp)
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    active.not_set(schema.id);
    active.not_set(schema.created_by);
    active.not_set(schema.created_at);
    active.set(schema.last_modified_by, Value::from(stamp.actor.clone()));
    active.set(schema.last_modified_at, Value::from(stamp.at));
}

/// Rewrite a deletion into a flag update.
pub fn mark_deleted<E, A>(schema: &EntitySchema<E>, active: &mut A, stamp: &AuditStamp)
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    stamp_update(schema, active, stamp);
    active.set(schema.is_deleted, Value::from(true));
}

/// Undo a soft delete.
pub fn mark_restored<E, A>(schema: &EntitySchema<E>, active: &mut A, stamp: &AuditStamp)
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
{
    stamp_update(schema, active, stamp);
    active.set(schema.is_deleted, Value::from(false));
}
