//! DQL parsing and translation to SQL.
//!
//! A query travels through [`parse()`], a list of [`TreeWalker`] rewrites
//! and the SQL walker, which emits an SQL statement together with the
//! [`ResultSetMapping`] the hydrators read its rows with.

pub mod alias;
pub use alias::TableAliases;

pub mod ast;

pub mod components;
pub use components::{QueryComponent, QueryComponents};

pub mod parse;
pub use parse::parse;

pub mod persister;

pub mod rsm;
pub use rsm::{ColumnKind, FieldResult, MetaResult, ResultSetMapping, ScalarResult};

pub mod serializer;
pub use serializer::{Params, Serializer};

pub mod stmt;
pub use stmt::Statement;

pub mod walker;
pub use walker::{
    compile, compile_collection, compile_statement, CompileOptions, CompiledQuery, TreeWalker,
};
