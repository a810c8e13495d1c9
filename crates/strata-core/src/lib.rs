#[macro_use]
mod macros;

pub mod driver;
pub use driver::{Connection, Driver};

mod error;
pub use error::{Error, IntoError};

pub mod mapping;

mod schema;
pub use schema::Schema;

mod value;
pub use value::{MappingArray, Value};

pub type Result<T, E = Error> = core::result::Result<T, E>;
