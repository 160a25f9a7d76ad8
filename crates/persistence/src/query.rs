//! Query arguments for the generic repository.
//!
//! A [`QuerySpec`] carries the filter, ordering, joins and deleted-row scope
//! of a read; a [`Projection`] decides the shape of each returned row.

use std::marker::PhantomData;

use sea_orm::sea_query::{IntoCondition, SimpleExpr};
use sea_orm::{
    Condition, EntityTrait, FromQueryResult, JoinType, Order, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select, SelectModel, Selector,
};

use crate::entity::EntitySchema;

/// Which rows a query sees with respect to the soft-delete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedScope {
    /// Live rows only
    #[default]
    Exclude,
    /// Live and soft-deleted rows
    Include,
    /// Soft-deleted rows only
    Only,
}

/// Filter, order, joins and deleted-row scope for one read.
#[derive(Debug)]
pub struct QuerySpec<E: EntityTrait> {
    condition: Condition,
    order: Vec<(E::Column, Order)>,
    joins: Vec<E::Relation>,
    scope: DeletedScope,
}

impl<E: EntityTrait> Default for QuerySpec<E> {
    fn default() -> Self {
        Self {
            condition: Condition::all(),
            order: Vec::new(),
            joins: Vec::new(),
            scope: DeletedScope::Exclude,
        }
    }
}

impl<E: EntityTrait> QuerySpec<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND another condition onto the filter.
    pub fn filter<F: IntoCondition>(mut self, condition: F) -> Self {
        self.condition = self.condition.add(condition.into_condition());
        self
    }

    pub fn order_by_asc(mut self, column: E::Column) -> Self {
        self.order.push((column, Order::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: E::Column) -> Self {
        self.order.push((column, Order::Desc));
        self
    }

    /// LEFT JOIN a related table so the filter can reach its columns.
    pub fn join(mut self, relation: E::Relation) -> Self {
        self.joins.push(relation);
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.scope = DeletedScope::Include;
        self
    }

    pub fn only_deleted(mut self) -> Self {
        self.scope = DeletedScope::Only;
        self
    }

    pub fn scope(&self) -> DeletedScope {
        self.scope
    }

    pub fn is_ordered(&self) -> bool {
        !self.order.is_empty()
    }

    /// Apply this spec to a select over `E`.
    pub fn apply(&self, schema: &EntitySchema<E>, select: Select<E>) -> Select<E> {
        let mut select = select;

        for relation in &self.joins {
            select = select.join(JoinType::LeftJoin, relation.def());
        }

        select = match self.scope {
            DeletedScope::Exclude => select.filter(schema.deleted(false)),
            DeletedScope::Include => select,
            DeletedScope::Only => select.filter(schema.deleted(true)),
        };

        if !self.condition.is_empty() {
            select = select.filter(self.condition.clone());
        }

        for (column, order) in &self.order {
            select = select.order_by(*column, order.clone());
        }

        select
    }
}

enum Item<E: EntityTrait> {
    Column(E::Column),
    Aliased(SimpleExpr, String),
}

impl<E: EntityTrait> Clone for Item<E> {
    fn clone(&self) -> Self {
        match self {
            Item::Column(column) => Item::Column(*column),
            Item::Aliased(expr, alias) => Item::Aliased(expr.clone(), alias.clone()),
        }
    }
}

/// Row shape of a read: the whole model, or selected columns and
/// expressions decoded into any [`FromQueryResult`] type.
pub struct Projection<E: EntityTrait, R> {
    items: Vec<Item<E>>,
    _row: PhantomData<fn() -> R>,
}

impl<E: EntityTrait, R> Clone for Projection<E, R> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            _row: PhantomData,
        }
    }
}

impl<E: EntityTrait> Projection<E, E::Model> {
    /// Every column, decoded as the entity model.
    pub fn entity() -> Self {
        Self {
            items: Vec::new(),
            _row: PhantomData,
        }
    }
}

impl<E: EntityTrait, R: FromQueryResult> Projection<E, R> {
    pub fn columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = E::Column>,
    {
        Self {
            items: columns.into_iter().map(Item::Column).collect(),
            _row: PhantomData,
        }
    }

    pub fn column(mut self, column: E::Column) -> Self {
        self.items.push(Item::Column(column));
        self
    }

    /// Select an arbitrary expression under `alias`.
    pub fn expr_as(mut self, expr: impl Into<SimpleExpr>, alias: &str) -> Self {
        self.items.push(Item::Aliased(expr.into(), alias.to_string()));
        self
    }

    /// Turn a select into a selector yielding `R`.
    pub fn apply(&self, select: Select<E>) -> Selector<SelectModel<R>> {
        if self.items.is_empty() {
            return select.into_model::<R>();
        }

        let mut select = select.select_only();
        for item in &self.items {
            select = match item {
                Item::Column(column) => select.column(*column),
                Item::Aliased(expr, alias) => select.column_as(expr.clone(), alias.as_str()),
            };
        }
        select.into_model::<R>()
    }
}
