use crate::{
    config::Config,
    db::schema::ColumnLayout,
    error::{ErrorOrigin, InternalError},
    obs::sink::{MetricsSink, with_metrics_sink},
    store::{RowRef, RowStore, TableKey},
};
use rowmap_schema::node::{SchemaDescriptor, SchemaSet};
use std::{collections::HashMap, sync::Arc, thread};

///
/// Session
///
/// One open store plus the schema registry it was opened with. Column
/// layouts are validated on first use and cached for the life of the
/// session.
///

pub struct Session<S: RowStore> {
    pub(crate) store: S,
    pub(crate) schemas: Arc<SchemaSet>,
    pub(crate) config: Config,
    metrics: Option<Arc<dyn MetricsSink>>,
    pub(crate) layouts: HashMap<String, Arc<ColumnLayout>>,
}

impl<S: RowStore> Session<S> {
    #[must_use]
    pub fn new(store: S, schemas: impl Into<Arc<SchemaSet>>) -> Self {
        Self {
            store,
            schemas: schemas.into(),
            config: Config::default(),
            metrics: None,
            layouts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self.layouts.clear();
        self
    }

    /// Route metrics for every call made through this session to `sink`.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access, e.g. to begin or end a write transaction.
    ///
    /// Cached layouts assume the columns they describe stay put.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Give the store back, dropping cached layouts.
    pub fn into_store(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------
    // Preconditions
    // ------------------------------------------------------------------

    pub(crate) fn check_thread(&self) -> Result<(), InternalError> {
        if thread::current().id() == self.store.owner_thread() {
            Ok(())
        } else {
            Err(InternalError::cross_thread())
        }
    }

    pub(crate) fn check_write(&self) -> Result<(), InternalError> {
        if self.store.is_in_write_transaction() {
            Ok(())
        } else {
            Err(InternalError::not_in_transaction())
        }
    }

    // Thread check plus write check, in that order.
    pub(crate) fn check_mutation(&self) -> Result<(), InternalError> {
        self.check_thread()?;
        self.check_write()
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    /// Run `f` with this session's metrics sink installed, if any.
    pub(crate) fn with_metrics<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        match self.metrics.clone() {
            Some(sink) => with_metrics_sink(sink, || f(self)),
            None => f(self),
        }
    }

    pub(crate) fn descriptor(&self, schema: &str) -> Result<Arc<SchemaDescriptor>, InternalError> {
        self.schemas.get(schema).cloned().ok_or_else(|| {
            InternalError::not_found(
                ErrorOrigin::Schema,
                format!("schema '{schema}' is not registered"),
            )
        })
    }

    pub(crate) fn table_name_for(&self, schema: &str) -> String {
        rowmap_schema::node::table_name(&self.config.table_prefix, schema)
    }

    /// Cached layout for `schema`, validating the table on first use.
    pub(crate) fn layout(&mut self, schema: &str) -> Result<Arc<ColumnLayout>, InternalError> {
        if let Some(layout) = self.layouts.get(schema) {
            return Ok(layout.clone());
        }

        self.validate_layout(schema)
    }

    /// Layout of the schema whose table is `table`.
    pub(crate) fn layout_for_table(
        &mut self,
        table: TableKey,
    ) -> Result<Arc<ColumnLayout>, InternalError> {
        if let Some(layout) = self.layouts.values().find(|l| l.table == table) {
            return Ok(layout.clone());
        }

        let schema = self
            .schemas
            .names()
            .find(|name| self.store.table(&self.table_name_for(name)) == Some(table))
            .map(str::to_string)
            .ok_or_else(|| {
                InternalError::not_found(
                    ErrorOrigin::Schema,
                    format!("table {table} does not belong to any registered schema"),
                )
            })?;

        self.layout(&schema)
    }

    /// Reject rows owned by another store instance.
    pub(crate) fn ensure_local(&self, row: RowRef, origin: ErrorOrigin) -> Result<(), InternalError> {
        if row.store == self.store.store_id() {
            Ok(())
        } else {
            Err(InternalError::unsupported(
                origin,
                format!(
                    "row {row} belongs to store {}, not {}; copy it out first",
                    row.store,
                    self.store.store_id()
                ),
            ))
        }
    }

    pub(crate) fn row_ref(&self, table: TableKey, row: crate::store::RowKey) -> RowRef {
        RowRef::new(self.store.store_id(), table, row)
    }
}
