use super::{Connect, Db};
use crate::{Result, UnitOfWork};

use std::collections::HashMap;
use std::sync::Arc;
use strata_core::driver::Driver;
use strata_core::mapping::{ClassDefinition, MetadataFactory, NamingStrategy};

pub struct Builder {
    /// Class definitions, built into metadata on connect
    factory: MetadataFactory,

    query_cache: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            factory: MetadataFactory::new(),
            query_cache: true,
        }
    }
}

impl Builder {
    pub fn register(&mut self, definition: ClassDefinition) -> &mut Self {
        self.factory.register(definition);
        self
    }

    pub fn naming_strategy(&mut self, naming: NamingStrategy) -> &mut Self {
        self.factory.naming_strategy(naming);
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.factory.table_name_prefix(prefix);
        self
    }

    /// Reuse compiled SQL for queries with the same DQL, tree walkers and
    /// limits. Enabled by default.
    pub fn query_cache(&mut self, enabled: bool) -> &mut Self {
        self.query_cache = enabled;
        self
    }

    pub fn connect(&mut self, url: &str) -> Result<Db> {
        self.build(Connect::new(url)?)
    }

    pub fn build(&mut self, driver: impl Driver + 'static) -> Result<Db> {
        let schema = Arc::new(self.factory.schema()?);
        let connection = driver.connect()?;

        log::debug!(
            "connected; url={} classes={}",
            driver.url(),
            schema.len()
        );

        Ok(Db {
            uow: UnitOfWork::new(schema.clone()),
            schema,
            driver: Box::new(driver),
            connection,
            query_cache: self.query_cache.then(HashMap::new),
        })
    }
}
