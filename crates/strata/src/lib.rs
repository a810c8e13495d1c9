//! An object-relational mapper.
//!
//! Entities are described by [`ClassDefinition`](mapping::ClassDefinition)s,
//! registered on a [`Builder`] and tracked by the [`UnitOfWork`] of a [`Db`].
//! They are loaded with DQL queries, changed in memory and written back by
//! [`Db::flush`].

pub mod db;
pub use db::{Builder, Db};

pub mod hydration;
pub use hydration::ResultItem;

mod query;
pub use query::Query;

pub mod unit_of_work;
pub use unit_of_work::{Collection, Entity, EntityId, EntityState, UnitOfWork};

pub use strata_core::{driver, map, mapping, Error, Result, Schema, Value};
pub use strata_sql as sql;
