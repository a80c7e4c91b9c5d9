//! Row-store collaborator boundary.
//!
//! The engine never touches storage directly; every table, column and row
//! operation goes through [`RowStore`]. [`MemoryStore`] is the in-process
//! reference implementation used by tests and embedders without a native
//! engine.

mod error;
mod key;
mod memory;


pub use error::StoreError;
pub use key::{RowKey, RowRef, StoreId, TableKey};
pub use memory::MemoryStore;

use rowmap_schema::{types::ColumnType, value::Value};
use std::thread::ThreadId;

///
/// RowStore
///
/// Column-oriented table storage as consumed by the mapping engine.
/// Columns are addressed by position; positions are stable for the life
/// of a table.
///

pub trait RowStore {
    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    fn store_id(&self) -> StoreId;

    /// Thread that opened this store; every engine call must come from it.
    fn owner_thread(&self) -> ThreadId;

    fn is_in_write_transaction(&self) -> bool;

    // ------------------------------------------------------------------
    // Tables and columns
    // ------------------------------------------------------------------

    fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    fn table(&self, name: &str) -> Option<TableKey>;

    fn table_name(&self, table: TableKey) -> Result<String, StoreError>;

    fn get_or_create_table(&mut self, name: &str) -> Result<TableKey, StoreError>;

    /// Add a value column and return its position.
    fn add_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        nullable: bool,
    ) -> Result<usize, StoreError>;

    /// Add a link (`ColumnType::Link`) or link-list (`ColumnType::LinkList`)
    /// column pointing at `target`.
    fn add_link_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        target: TableKey,
    ) -> Result<usize, StoreError>;

    /// Register `column` as the primary key, or clear it with `None`.
    fn set_primary_key(&mut self, table: TableKey, column: Option<&str>) -> Result<(), StoreError>;

    fn primary_key(&self, table: TableKey) -> Result<Option<String>, StoreError>;

    fn add_search_index(&mut self, table: TableKey, column: usize) -> Result<(), StoreError>;

    fn has_search_index(&self, table: TableKey, column: usize) -> Result<bool, StoreError>;

    fn column_count(&self, table: TableKey) -> Result<usize, StoreError>;

    fn column_name(&self, table: TableKey, column: usize) -> Result<String, StoreError>;

    fn column_type(&self, table: TableKey, column: usize) -> Result<ColumnType, StoreError>;

    fn is_column_nullable(&self, table: TableKey, column: usize) -> Result<bool, StoreError>;

    /// Target table of a link or link-list column.
    fn link_target(&self, table: TableKey, column: usize) -> Result<Option<TableKey>, StoreError>;

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    fn row_count(&self, table: TableKey) -> Result<usize, StoreError>;

    /// First row whose `column` equals `value`. `Value::Null` finds a
    /// null-valued row.
    fn find_first(
        &self,
        table: TableKey,
        column: usize,
        value: &Value,
    ) -> Result<Option<RowKey>, StoreError>;

    fn add_empty_row(&mut self, table: TableKey) -> Result<RowKey, StoreError>;

    /// Add a row whose primary-key column is `value`. Fails when another
    /// row already holds it.
    fn add_empty_row_with_primary_key(
        &mut self,
        table: TableKey,
        value: &Value,
    ) -> Result<RowKey, StoreError>;

    fn get_value(&self, table: TableKey, row: RowKey, column: usize) -> Result<Value, StoreError>;

    fn set_value(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        value: Value,
    ) -> Result<(), StoreError>;

    fn get_link(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Option<RowKey>, StoreError>;

    fn set_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError>;

    fn nullify_link(&mut self, table: TableKey, row: RowKey, column: usize)
    -> Result<(), StoreError>;

    fn link_list(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Vec<RowKey>, StoreError>;

    fn clear_link_list(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<(), StoreError>;

    fn append_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError>;
}
