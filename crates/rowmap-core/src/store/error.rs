use rowmap_schema::types::ColumnType;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Failure reported by the row-store collaborator. Wrapped in
/// `ErrorDetail::Store` once it crosses into the engine.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum StoreError {
    #[error("column '{name}' already exists in table '{table}'")]
    DuplicateColumn { table: String, name: String },

    #[error("primary key value {value} already exists in table '{table}'")]
    DuplicatePrimaryKey { table: String, value: String },

    #[error("table '{table}' has no primary key column")]
    NoPrimaryKey { table: String },

    #[error("column {column} does not exist in table '{table}'")]
    NoSuchColumn { table: String, column: String },

    #[error("row {row} does not exist in table '{table}'")]
    NoSuchRow { table: String, row: usize },

    #[error("table {table} does not exist")]
    NoSuchTable { table: String },

    #[error("no write transaction is active")]
    NotInWriteTransaction,

    #[error("column '{column}' of table '{table}' does not accept null")]
    NullNotAllowed { table: String, column: String },

    #[error("a write transaction is already active")]
    TransactionActive,

    #[error("column '{column}' of table '{table}' holds {expected}, not {found}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: ColumnType,
        found: &'static str,
    },
}
