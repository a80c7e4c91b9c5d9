use crate::store::{RowKey, RowStore, StoreError, StoreId, TableKey};
use rowmap_schema::{types::ColumnType, value::Value};
use std::thread::ThreadId;

///
/// Call
/// One mutating collaborator call, in the order it was made.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    AddRow { table: TableKey },
    SetValue { table: TableKey, row: RowKey, column: usize },
    SetLink { table: TableKey, row: RowKey, column: usize },
    NullifyLink { table: TableKey, row: RowKey, column: usize },
    ClearList { table: TableKey, row: RowKey, column: usize },
    Append { table: TableKey, row: RowKey, column: usize },
}

///
/// RecordingStore
/// Forwards to an inner store and logs every row mutation.
///

pub(crate) struct RecordingStore<S> {
    pub(crate) inner: S,
    pub(crate) calls: Vec<Call>,
}

impl<S: RowStore> RecordingStore<S> {
    pub(crate) const fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    pub(crate) fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl<S: RowStore> RowStore for RecordingStore<S> {
    fn store_id(&self) -> StoreId {
        self.inner.store_id()
    }

    fn owner_thread(&self) -> ThreadId {
        self.inner.owner_thread()
    }

    fn is_in_write_transaction(&self) -> bool {
        self.inner.is_in_write_transaction()
    }

    fn table(&self, name: &str) -> Option<TableKey> {
        self.inner.table(name)
    }

    fn table_name(&self, table: TableKey) -> Result<String, StoreError> {
        self.inner.table_name(table)
    }

    fn get_or_create_table(&mut self, name: &str) -> Result<TableKey, StoreError> {
        self.inner.get_or_create_table(name)
    }

    fn add_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        nullable: bool,
    ) -> Result<usize, StoreError> {
        self.inner.add_column(table, ty, name, nullable)
    }

    fn add_link_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        target: TableKey,
    ) -> Result<usize, StoreError> {
        self.inner.add_link_column(table, ty, name, target)
    }

    fn set_primary_key(&mut self, table: TableKey, column: Option<&str>) -> Result<(), StoreError> {
        self.inner.set_primary_key(table, column)
    }

    fn primary_key(&self, table: TableKey) -> Result<Option<String>, StoreError> {
        self.inner.primary_key(table)
    }

    fn add_search_index(&mut self, table: TableKey, column: usize) -> Result<(), StoreError> {
        self.inner.add_search_index(table, column)
    }

    fn has_search_index(&self, table: TableKey, column: usize) -> Result<bool, StoreError> {
        self.inner.has_search_index(table, column)
    }

    fn column_count(&self, table: TableKey) -> Result<usize, StoreError> {
        self.inner.column_count(table)
    }

    fn column_name(&self, table: TableKey, column: usize) -> Result<String, StoreError> {
        self.inner.column_name(table, column)
    }

    fn column_type(&self, table: TableKey, column: usize) -> Result<ColumnType, StoreError> {
        self.inner.column_type(table, column)
    }

    fn is_column_nullable(&self, table: TableKey, column: usize) -> Result<bool, StoreError> {
        self.inner.is_column_nullable(table, column)
    }

    fn link_target(&self, table: TableKey, column: usize) -> Result<Option<TableKey>, StoreError> {
        self.inner.link_target(table, column)
    }

    fn row_count(&self, table: TableKey) -> Result<usize, StoreError> {
        self.inner.row_count(table)
    }

    fn find_first(
        &self,
        table: TableKey,
        column: usize,
        value: &Value,
    ) -> Result<Option<RowKey>, StoreError> {
        self.inner.find_first(table, column, value)
    }

    fn add_empty_row(&mut self, table: TableKey) -> Result<RowKey, StoreError> {
        self.calls.push(Call::AddRow { table });
        self.inner.add_empty_row(table)
    }

    fn add_empty_row_with_primary_key(
        &mut self,
        table: TableKey,
        value: &Value,
    ) -> Result<RowKey, StoreError> {
        self.calls.push(Call::AddRow { table });
        self.inner.add_empty_row_with_primary_key(table, value)
    }

    fn get_value(&self, table: TableKey, row: RowKey, column: usize) -> Result<Value, StoreError> {
        self.inner.get_value(table, row, column)
    }

    fn set_value(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        value: Value,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::SetValue { table, row, column });
        self.inner.set_value(table, row, column, value)
    }

    fn get_link(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Option<RowKey>, StoreError> {
        self.inner.get_link(table, row, column)
    }

    fn set_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::SetLink { table, row, column });
        self.inner.set_link(table, row, column, target)
    }

    fn nullify_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::NullifyLink { table, row, column });
        self.inner.nullify_link(table, row, column)
    }

    fn link_list(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Vec<RowKey>, StoreError> {
        self.inner.link_list(table, row, column)
    }

    fn clear_link_list(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::ClearList { table, row, column });
        self.inner.clear_link_list(table, row, column)
    }

    fn append_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError> {
        self.calls.push(Call::Append { table, row, column });
        self.inner.append_link(table, row, column, target)
    }
}
