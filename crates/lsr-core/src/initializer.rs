//! Table initializers: named setup routines run against a service client.
//!
//! Initializers are registered explicitly under a string id and looked up by
//! that id when a table is created.

use crate::retry::{Classify, ErrorKind};
use std::collections::BTreeMap;
use std::fmt;

/// Seeds or otherwise prepares a table using a client of type `C`.
pub trait TableInitializer<C>: Send + Sync {
    fn run(&self, client: &C) -> anyhow::Result<()>;
}

impl<C, F> TableInitializer<C> for F
where
    F: Fn(&C) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, client: &C) -> anyhow::Result<()> {
        self(client)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitializerError {
    #[error("initializer not found: {0}")]
    NotFound(String),
    #[error("initializer already registered: {0}")]
    Duplicate(String),
    #[error("initializer '{id}' failed for table '{table}'")]
    Failed {
        table: String,
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Classify for InitializerError {
    fn kind(&self) -> ErrorKind {
        match self {
            InitializerError::NotFound(_) => ErrorKind::from_static("initializer-not-found"),
            InitializerError::Duplicate(_) => ErrorKind::from_static("initializer-duplicate"),
            InitializerError::Failed { .. } => ErrorKind::from_static("initializer-failed"),
        }
    }
}

pub struct InitializerRegistry<C> {
    initializers: BTreeMap<String, Box<dyn TableInitializer<C>>>,
}

impl<C> Default for InitializerRegistry<C> {
    fn default() -> Self {
        Self {
            initializers: BTreeMap::new(),
        }
    }
}

impl<C> fmt::Debug for InitializerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl<C> InitializerRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I>(&mut self, id: impl Into<String>, initializer: I) -> Result<(), InitializerError>
    where
        I: TableInitializer<C> + 'static,
    {
        let id = id.into();
        if self.initializers.contains_key(&id) {
            return Err(InitializerError::Duplicate(id));
        }
        self.initializers.insert(id, Box::new(initializer));
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.initializers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.initializers.keys().map(String::as_str).collect()
    }

    /// Run the initializer registered as `id` for `table`.
    pub fn invoke(&self, table: &str, id: &str, client: &C) -> Result<(), InitializerError> {
        tracing::info!("Initializing '{}' table", table);
        let initializer = self
            .initializers
            .get(id)
            .ok_or_else(|| InitializerError::NotFound(id.to_string()))?;
        if let Err(source) = initializer.run(client) {
            tracing::error!(table, id, "initializer failed: {:#}", source);
            return Err(InitializerError::Failed {
                table: table.to_string(),
                id: id.to_string(),
                source,
            });
        }
        tracing::info!("Table '{}' initialized", table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{FailFastSet, Retry, RetryPolicy};
    use std::cell::Cell;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTableClient {
        rows: Mutex<Vec<String>>,
    }

    struct SeedProducts;

    impl TableInitializer<FakeTableClient> for SeedProducts {
        fn run(&self, client: &FakeTableClient) -> anyhow::Result<()> {
            let mut rows = client.rows.lock().unwrap();
            rows.push("product-1".to_string());
            rows.push("product-2".to_string());
            Ok(())
        }
    }

    #[test]
    fn registered_initializer_runs_against_client() {
        let mut registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        registry.register("products", SeedProducts).unwrap();
        let client = FakeTableClient::default();
        registry.invoke("Products", "products", &client).unwrap();
        assert_eq!(client.rows.lock().unwrap().len(), 2);
    }

    #[test]
    fn closures_are_initializers() {
        let mut registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        registry
            .register("noop", |_: &FakeTableClient| -> anyhow::Result<()> { Ok(()) })
            .unwrap();
        assert!(registry.contains("noop"));
        assert_eq!(registry.ids(), vec!["noop"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        registry.register("products", SeedProducts).unwrap();
        let err = registry.register("products", SeedProducts).unwrap_err();
        assert!(matches!(err, InitializerError::Duplicate(ref id) if id == "products"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        let err = registry
            .invoke("Orders", "orders", &FakeTableClient::default())
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "initializer-not-found");
    }

    #[test]
    fn failure_keeps_initializer_error_as_source() {
        let mut registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        registry
            .register("broken", |_: &FakeTableClient| -> anyhow::Result<()> {
                anyhow::bail!("table not active")
            })
            .unwrap();
        let err = registry
            .invoke("Orders", "broken", &FakeTableClient::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "initializer 'broken' failed for table 'Orders'");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "table not active");
    }

    #[test]
    fn missing_initializer_fails_fast_under_retry() {
        let registry: InitializerRegistry<FakeTableClient> = InitializerRegistry::new();
        let client = FakeTableClient::default();
        let calls = Cell::new(0);
        let fail_fast: FailFastSet = ["initializer-not-found"].into_iter().collect();
        let out = Retry::new(RetryPolicy::immediate(5))
            .fail_fast(fail_fast)
            .execute(|| {
                calls.set(calls.get() + 1);
                registry.invoke("Orders", "orders", &client)
            });
        assert!(out.unwrap_err().is_fail_fast());
        assert_eq!(calls.get(), 1);
    }
}
