use crate::store::{RowKey, RowStore, StoreError, StoreId, TableKey};
use rowmap_schema::{types::ColumnType, value::Value};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    thread::{self, ThreadId},
};
use tracing::debug;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

///
/// Cell
///

#[derive(Clone, Debug, PartialEq)]
enum Cell {
    Value(Value),
    Link(Option<RowKey>),
    LinkList(Vec<RowKey>),
}

///
/// Column
///

#[derive(Clone, Debug)]
struct Column {
    name: String,
    ty: ColumnType,
    nullable: bool,
    indexed: bool,
    target: Option<TableKey>,
}

impl Column {
    // Cell a new row starts with.
    fn empty_cell(&self) -> Cell {
        match self.ty {
            ColumnType::Link => Cell::Link(None),
            ColumnType::LinkList => Cell::LinkList(Vec::new()),
            _ if self.nullable => Cell::Value(Value::Null),
            ty => Cell::Value(zero(ty)),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self.ty, value),
            (_, Value::Null)
                | (ColumnType::Bool, Value::Bool(_))
                | (ColumnType::Int, Value::Int(_))
                | (ColumnType::Float, Value::Float(_))
                | (ColumnType::Double, Value::Double(_))
                | (ColumnType::String, Value::String(_))
                | (ColumnType::Binary, Value::Binary(_))
                | (ColumnType::Date, Value::Timestamp(_))
        )
    }
}

fn zero(ty: ColumnType) -> Value {
    match ty {
        ColumnType::Bool => Value::Bool(false),
        ColumnType::Int => Value::Int(0),
        ColumnType::Float => Value::Float(0.0),
        ColumnType::Double => Value::Double(0.0),
        ColumnType::String => Value::String(String::new()),
        ColumnType::Binary => Value::Binary(Vec::new()),
        ColumnType::Date => Value::Timestamp(rowmap_schema::value::Timestamp::default()),
        ColumnType::Link | ColumnType::LinkList => Value::Null,
    }
}

///
/// Table
///

#[derive(Clone, Debug)]
struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
    primary_key: Option<usize>,
}

impl Table {
    fn column(&self, column: usize) -> Result<&Column, StoreError> {
        self.columns.get(column).ok_or_else(|| StoreError::NoSuchColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    fn cell(&self, row: RowKey, column: usize) -> Result<&Cell, StoreError> {
        self.column(column)?;
        self.rows
            .get(row.0)
            .and_then(|cells| cells.get(column))
            .ok_or_else(|| StoreError::NoSuchRow {
                table: self.name.clone(),
                row: row.0,
            })
    }

    fn cell_mut(&mut self, row: RowKey, column: usize) -> Result<&mut Cell, StoreError> {
        self.column(column)?;
        let name = &self.name;
        self.rows
            .get_mut(row.0)
            .and_then(|cells| cells.get_mut(column))
            .ok_or_else(|| StoreError::NoSuchRow {
                table: name.clone(),
                row: row.0,
            })
    }

    fn find(&self, column: usize, value: &Value) -> Option<RowKey> {
        self.rows
            .iter()
            .position(|cells| matches!(&cells[column], Cell::Value(v) if v == value))
            .map(RowKey)
    }

    fn push_row(&mut self) -> RowKey {
        let cells = self.columns.iter().map(Column::empty_cell).collect();
        self.rows.push(cells);

        RowKey(self.rows.len() - 1)
    }
}

///
/// State
/// Everything a cancelled write transaction rolls back.
///

#[derive(Clone, Debug, Default)]
struct State {
    tables: Vec<Table>,
    by_name: HashMap<String, TableKey>,
}

///
/// MemoryStore
///
/// In-process [`RowStore`]. Writes require an active write transaction;
/// `cancel` restores the state captured by `begin_write`.
///

#[derive(Debug)]
pub struct MemoryStore {
    id: StoreId,
    owner: ThreadId,
    state: State,
    snapshot: Option<State>,
}

impl MemoryStore {
    /// Open an empty store owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        let id = StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed));
        debug!(store = %id, "memory store opened");

        Self {
            id,
            owner: thread::current().id(),
            state: State::default(),
            snapshot: None,
        }
    }

    pub fn begin_write(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.snapshot = Some(self.state.clone());

        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or(StoreError::NotInWriteTransaction)
    }

    pub fn cancel(&mut self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.take().ok_or(StoreError::NotInWriteTransaction)?;
        self.state = snapshot;

        Ok(())
    }

    /// Run `f` inside a write transaction, committing on `Ok` and
    /// cancelling on `Err`.
    pub fn write<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.begin_write()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.cancel()?;
                Err(err)
            }
        }
    }

    fn table_ref(&self, table: TableKey) -> Result<&Table, StoreError> {
        self.state
            .tables
            .get(table.0)
            .ok_or_else(|| StoreError::NoSuchTable {
                table: table.to_string(),
            })
    }

    fn table_mut(&mut self, table: TableKey) -> Result<&mut Table, StoreError> {
        if self.snapshot.is_none() {
            return Err(StoreError::NotInWriteTransaction);
        }

        self.state
            .tables
            .get_mut(table.0)
            .ok_or_else(|| StoreError::NoSuchTable {
                table: table.to_string(),
            })
    }

    fn push_column(&mut self, table: TableKey, column: Column) -> Result<usize, StoreError> {
        let t = self.table_mut(table)?;
        if t.columns.iter().any(|c| c.name == column.name) {
            return Err(StoreError::DuplicateColumn {
                table: t.name.clone(),
                name: column.name,
            });
        }

        let cell = column.empty_cell();
        for row in &mut t.rows {
            row.push(cell.clone());
        }
        t.columns.push(column);

        Ok(t.columns.len() - 1)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore for MemoryStore {
    fn store_id(&self) -> StoreId {
        self.id
    }

    fn owner_thread(&self) -> ThreadId {
        self.owner
    }

    fn is_in_write_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn table(&self, name: &str) -> Option<TableKey> {
        self.state.by_name.get(name).copied()
    }

    fn table_name(&self, table: TableKey) -> Result<String, StoreError> {
        Ok(self.table_ref(table)?.name.clone())
    }

    fn get_or_create_table(&mut self, name: &str) -> Result<TableKey, StoreError> {
        if let Some(key) = self.table(name) {
            return Ok(key);
        }
        if self.snapshot.is_none() {
            return Err(StoreError::NotInWriteTransaction);
        }

        let key = TableKey(self.state.tables.len());
        self.state.tables.push(Table {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            primary_key: None,
        });
        self.state.by_name.insert(name.to_string(), key);

        Ok(key)
    }

    fn add_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        nullable: bool,
    ) -> Result<usize, StoreError> {
        self.push_column(
            table,
            Column {
                name: name.to_string(),
                ty,
                nullable,
                indexed: false,
                target: None,
            },
        )
    }

    fn add_link_column(
        &mut self,
        table: TableKey,
        ty: ColumnType,
        name: &str,
        target: TableKey,
    ) -> Result<usize, StoreError> {
        self.table_ref(target)?;

        self.push_column(
            table,
            Column {
                name: name.to_string(),
                ty,
                nullable: ty == ColumnType::Link,
                indexed: false,
                target: Some(target),
            },
        )
    }

    fn set_primary_key(&mut self, table: TableKey, column: Option<&str>) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        t.primary_key = match column {
            Some(name) => Some(t.columns.iter().position(|c| c.name == name).ok_or_else(
                || StoreError::NoSuchColumn {
                    table: t.name.clone(),
                    column: name.to_string(),
                },
            )?),
            None => None,
        };

        Ok(())
    }

    fn primary_key(&self, table: TableKey) -> Result<Option<String>, StoreError> {
        let t = self.table_ref(table)?;

        Ok(t.primary_key.map(|i| t.columns[i].name.clone()))
    }

    fn add_search_index(&mut self, table: TableKey, column: usize) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        t.column(column)?;
        t.columns[column].indexed = true;

        Ok(())
    }

    fn has_search_index(&self, table: TableKey, column: usize) -> Result<bool, StoreError> {
        Ok(self.table_ref(table)?.column(column)?.indexed)
    }

    fn column_count(&self, table: TableKey) -> Result<usize, StoreError> {
        Ok(self.table_ref(table)?.columns.len())
    }

    fn column_name(&self, table: TableKey, column: usize) -> Result<String, StoreError> {
        Ok(self.table_ref(table)?.column(column)?.name.clone())
    }

    fn column_type(&self, table: TableKey, column: usize) -> Result<ColumnType, StoreError> {
        Ok(self.table_ref(table)?.column(column)?.ty)
    }

    fn is_column_nullable(&self, table: TableKey, column: usize) -> Result<bool, StoreError> {
        Ok(self.table_ref(table)?.column(column)?.nullable)
    }

    fn link_target(&self, table: TableKey, column: usize) -> Result<Option<TableKey>, StoreError> {
        Ok(self.table_ref(table)?.column(column)?.target)
    }

    fn row_count(&self, table: TableKey) -> Result<usize, StoreError> {
        Ok(self.table_ref(table)?.rows.len())
    }

    fn find_first(
        &self,
        table: TableKey,
        column: usize,
        value: &Value,
    ) -> Result<Option<RowKey>, StoreError> {
        let t = self.table_ref(table)?;
        t.column(column)?;

        Ok(t.find(column, value))
    }

    fn add_empty_row(&mut self, table: TableKey) -> Result<RowKey, StoreError> {
        Ok(self.table_mut(table)?.push_row())
    }

    fn add_empty_row_with_primary_key(
        &mut self,
        table: TableKey,
        value: &Value,
    ) -> Result<RowKey, StoreError> {
        let t = self.table_mut(table)?;
        let Some(pk) = t.primary_key else {
            return Err(StoreError::NoPrimaryKey {
                table: t.name.clone(),
            });
        };
        if t.find(pk, value).is_some() {
            return Err(StoreError::DuplicatePrimaryKey {
                table: t.name.clone(),
                value: value.to_string(),
            });
        }

        let row = t.push_row();
        t.rows[row.0][pk] = Cell::Value(value.clone());

        Ok(row)
    }

    fn get_value(&self, table: TableKey, row: RowKey, column: usize) -> Result<Value, StoreError> {
        let t = self.table_ref(table)?;
        match t.cell(row, column)? {
            Cell::Value(v) => Ok(v.clone()),
            _ => Err(StoreError::TypeMismatch {
                table: t.name.clone(),
                column: t.columns[column].name.clone(),
                expected: t.columns[column].ty,
                found: "value",
            }),
        }
    }

    fn set_value(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        value: Value,
    ) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        let col = t.column(column)?;

        if !col.accepts(&value) {
            return Err(StoreError::TypeMismatch {
                table: t.name.clone(),
                column: col.name.clone(),
                expected: col.ty,
                found: value.type_label(),
            });
        }
        if value.is_null() && !col.nullable {
            return Err(StoreError::NullNotAllowed {
                table: t.name.clone(),
                column: col.name.clone(),
            });
        }
        if t.primary_key == Some(column)
            && t.find(column, &value).is_some_and(|existing| existing != row)
        {
            return Err(StoreError::DuplicatePrimaryKey {
                table: t.name.clone(),
                value: value.to_string(),
            });
        }

        *t.cell_mut(row, column)? = Cell::Value(value);

        Ok(())
    }

    fn get_link(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Option<RowKey>, StoreError> {
        let t = self.table_ref(table)?;
        match t.cell(row, column)? {
            Cell::Link(target) => Ok(*target),
            _ => Err(link_mismatch(t, column, ColumnType::Link)),
        }
    }

    fn set_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        match t.cell_mut(row, column)? {
            Cell::Link(slot) => {
                *slot = Some(target);
                Ok(())
            }
            _ => Err(link_mismatch(t, column, ColumnType::Link)),
        }
    }

    fn nullify_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        match t.cell_mut(row, column)? {
            Cell::Link(slot) => {
                *slot = None;
                Ok(())
            }
            _ => Err(link_mismatch(t, column, ColumnType::Link)),
        }
    }

    fn link_list(
        &self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<Vec<RowKey>, StoreError> {
        let t = self.table_ref(table)?;
        match t.cell(row, column)? {
            Cell::LinkList(rows) => Ok(rows.clone()),
            _ => Err(link_mismatch(t, column, ColumnType::LinkList)),
        }
    }

    fn clear_link_list(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
    ) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        match t.cell_mut(row, column)? {
            Cell::LinkList(rows) => {
                rows.clear();
                Ok(())
            }
            _ => Err(link_mismatch(t, column, ColumnType::LinkList)),
        }
    }

    fn append_link(
        &mut self,
        table: TableKey,
        row: RowKey,
        column: usize,
        target: RowKey,
    ) -> Result<(), StoreError> {
        let t = self.table_mut(table)?;
        match t.cell_mut(row, column)? {
            Cell::LinkList(rows) => {
                rows.push(target);
                Ok(())
            }
            _ => Err(link_mismatch(t, column, ColumnType::LinkList)),
        }
    }
}

fn link_mismatch(table: &Table, column: usize, found: ColumnType) -> StoreError {
    let col = &table.columns[column];

    StoreError::TypeMismatch {
        table: table.name.clone(),
        column: col.name.clone(),
        expected: col.ty,
        found: if found == ColumnType::Link {
            "link"
        } else {
            "link_list"
        },
    }
}
