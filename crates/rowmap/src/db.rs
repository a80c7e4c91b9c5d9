use crate::error::Error;
use rowmap_core::{
    config::Config,
    db::{ColumnLayout, Session},
    object::{ObjectGraph, ObjectId, ObjectRef},
    obs::MetricsSink,
    store::{RowRef, RowStore, TableKey},
};
use rowmap_schema::{
    decl::ModelDecl,
    node::SchemaSet,
    value::Value,
};
use serde::Deserializer;
use serde_json::Value as JsonValue;
use std::{io, sync::Arc};

///
/// Db
/// Public facade over a core [`Session`].
/// Converts core errors into `rowmap::Error`.
///

pub struct Db<S: RowStore> {
    inner: Session<S>,
}

impl<S: RowStore> Db<S> {
    #[must_use]
    pub fn new(store: S, schemas: impl Into<Arc<SchemaSet>>) -> Self {
        Self {
            inner: Session::new(store, schemas),
        }
    }

    /// Build the schema registry from `models` and wrap `store`.
    pub fn from_models(
        store: S,
        models: impl IntoIterator<Item = ModelDecl>,
    ) -> Result<Self, Error> {
        let schemas = SchemaSet::build(models)?;

        Ok(Self::new(store, schemas))
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.inner = self.inner.with_config(config);
        self
    }

    /// Override the metrics sink for operations executed through this facade.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.inner = self.inner.metrics_sink(sink);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        self.inner.store()
    }

    pub const fn store_mut(&mut self) -> &mut S {
        self.inner.store_mut()
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        self.inner.schemas()
    }

    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.inner
    }

    #[must_use]
    pub fn into_session(self) -> Session<S> {
        self.inner
    }

    pub fn into_store(self) -> S {
        self.inner.into_store()
    }

    //
    // Tables
    //

    pub fn synthesize_schema(&mut self, schema: &str) -> Result<TableKey, Error> {
        Ok(self.inner.synthesize_schema(schema)?)
    }

    pub fn validate_schema(&mut self, schema: &str) -> Result<Arc<ColumnLayout>, Error> {
        Ok(self.inner.validate_schema(schema)?)
    }

    /// Synthesize missing tables and validate existing ones for every
    /// registered schema.
    pub fn open_schemas(&mut self) -> Result<(), Error> {
        Ok(self.inner.open_schemas()?)
    }

    //
    // Copy-in
    //

    pub fn copy_to_store(
        &mut self,
        graph: &ObjectGraph,
        source: impl Into<ObjectRef>,
    ) -> Result<RowRef, Error> {
        Ok(self.inner.copy_to_store(graph, source)?)
    }

    pub fn copy_or_update(
        &mut self,
        graph: &ObjectGraph,
        source: impl Into<ObjectRef>,
    ) -> Result<RowRef, Error> {
        Ok(self.inner.copy_or_update(graph, source)?)
    }

    pub fn copy_all_to_store<T: Into<ObjectRef>>(
        &mut self,
        graph: &ObjectGraph,
        roots: impl IntoIterator<Item = T>,
    ) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.copy_all_to_store(graph, roots)?)
    }

    pub fn copy_all_or_update<T: Into<ObjectRef>>(
        &mut self,
        graph: &ObjectGraph,
        roots: impl IntoIterator<Item = T>,
    ) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.copy_all_or_update(graph, roots)?)
    }

    //
    // JSON import
    //

    pub fn import_json_object(
        &mut self,
        schema: &str,
        json: &JsonValue,
        update: bool,
    ) -> Result<RowRef, Error> {
        Ok(self.inner.import_json_object(schema, json, update)?)
    }

    pub fn import_json_array(
        &mut self,
        schema: &str,
        items: &[JsonValue],
        update: bool,
    ) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.import_json_array(schema, items, update)?)
    }

    pub fn import_json_str(
        &mut self,
        schema: &str,
        text: &str,
        update: bool,
    ) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.import_json_str(schema, text, update)?)
    }

    pub fn import_json_stream<R: io::Read>(
        &mut self,
        schema: &str,
        reader: R,
        update: bool,
    ) -> Result<RowRef, Error> {
        Ok(self.inner.import_json_stream(schema, reader, update)?)
    }

    pub fn import_json_deserializer<'de, D: Deserializer<'de>>(
        &mut self,
        schema: &str,
        de: D,
        update: bool,
    ) -> Result<RowRef, Error> {
        Ok(self.inner.import_json_deserializer(schema, de, update)?)
    }

    //
    // Copy-out
    //

    pub fn create_detached_copy(
        &mut self,
        row: RowRef,
        max_depth: u32,
        graph: &mut ObjectGraph,
    ) -> Result<ObjectId, Error> {
        Ok(self.inner.create_detached_copy(row, max_depth, graph)?)
    }

    pub fn create_detached_copy_default(
        &mut self,
        row: RowRef,
        graph: &mut ObjectGraph,
    ) -> Result<ObjectId, Error> {
        Ok(self.inner.create_detached_copy_default(row, graph)?)
    }

    //
    // Reads
    //

    pub fn linking_rows(&mut self, row: RowRef, backlink: &str) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.linking_rows(row, backlink)?)
    }

    pub fn get_value(&mut self, row: RowRef, field: &str) -> Result<Value, Error> {
        Ok(self.inner.get_value(row, field)?)
    }

    pub fn get_link(&mut self, row: RowRef, field: &str) -> Result<Option<RowRef>, Error> {
        Ok(self.inner.get_link(row, field)?)
    }

    pub fn get_link_list(&mut self, row: RowRef, field: &str) -> Result<Vec<RowRef>, Error> {
        Ok(self.inner.get_link_list(row, field)?)
    }

    pub fn row_count(&mut self, schema: &str) -> Result<usize, Error> {
        Ok(self.inner.row_count(schema)?)
    }

    pub fn find_by_primary_key(
        &mut self,
        schema: &str,
        key: impl Into<Value>,
    ) -> Result<Option<RowRef>, Error> {
        Ok(self.inner.find_by_primary_key(schema, key)?)
    }
}
