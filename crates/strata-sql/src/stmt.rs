//! SQL statements produced by the walker and the persister, ready to be
//! serialized for a specific flavor.

mod create_table;
pub use create_table::{ColumnDef, CreateTable};

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{BinaryOp, ColumnRef, Expr, Param};

mod insert;
pub use insert::Insert;

mod select;
pub use select::{Join, JoinKind, OrderBy, Select, SelectItem, TableRef, TableWithJoins};

mod update;
pub use update::Update;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    Delete(Delete),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    pub fn is_query(&self) -> bool {
        matches!(self, Statement::Select(_))
            || matches!(self, Statement::Insert(insert) if !insert.returning.is_empty())
    }
}
