mod capability;
pub use capability::{Capability, Dialect};

mod rows;
pub use rows::{Row, Rows};

use crate::{Result, Value};

use std::{borrow::Cow, fmt::Debug};

/// A database backend.
///
/// Drivers are configured from a connection URL and hand out connections.
/// Pooling, retries and timeouts are the driver's business.
pub trait Driver: Debug {
    /// Returns the URL this driver is connecting to.
    fn url(&self) -> Cow<'_, str>;

    /// Describes the SQL dialect and features of the backend.
    fn capability(&self) -> &'static Capability;

    /// Creates a new connection to the database.
    fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// A single database connection.
///
/// Statements are passed as SQL text plus an ordered parameter list matching
/// the placeholders in the text.
pub trait Connection: Debug {
    /// Runs a query and returns its rows, keyed by column alias.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Identifier generated by the most recent insert on this connection.
    fn last_insert_id(&mut self) -> Result<Value>;
}
