use rowmap_schema::types::ColumnType;
use std::fmt;
use thiserror::Error as ThisError;

///
/// MigrationError
///
/// Every discrepancy found while validating one or more tables, grouped
/// per schema. Validation never stops at the first mismatch.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{}", render(.reports))]
pub struct MigrationError {
    pub reports: Vec<MigrationReport>,
}

impl MigrationError {
    /// Report for `schema`, when it failed.
    #[must_use]
    pub fn report(&self, schema: &str) -> Option<&MigrationReport> {
        self.reports.iter().find(|r| r.schema == schema)
    }

    /// Every mismatch across every schema.
    pub fn mismatches(&self) -> impl Iterator<Item = &SchemaMismatch> {
        self.reports.iter().flat_map(|r| r.mismatches.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.iter().map(|r| r.mismatches.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn render(reports: &[MigrationReport]) -> String {
    reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

///
/// MigrationReport
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationReport {
    pub schema: String,
    pub table: String,
    pub mismatches: Vec<SchemaMismatch>,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "migration required for schema '{}' (table '{}'):",
            self.schema, self.table
        )?;
        for mismatch in &self.mismatches {
            write!(f, "\n  - {mismatch}")?;
        }

        Ok(())
    }
}

///
/// NullabilityReason
/// Why a field refuses null when the store column accepts it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullabilityReason {
    PrimaryKey,
    Primitive,
    Required,
}

///
/// SchemaMismatch
/// One itemized difference between a descriptor and its stored table.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaMismatch {
    #[error("table '{table}' does not exist; synthesize the schema before opening it")]
    MissingTable { table: String },

    #[error("field count is less than expected: expected {expected}, found {found}")]
    FewerColumns { expected: usize, found: usize },

    #[error(
        "field count is more than expected: expected {expected}, found {found}; remove the extra columns or allow extra columns"
    )]
    ExtraColumns { expected: usize, found: usize },

    #[error("missing column for field '{field}'; add the column or remove the field")]
    MissingColumn { field: String },

    #[error("invalid type for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: ColumnType,
        found: ColumnType,
    },

    #[error("{}", store_allows_null(.field, .reason))]
    StoreAllowsNull {
        field: String,
        reason: NullabilityReason,
    },

    #[error(
        "field '{field}' does not accept null in the store; mark it required, use the primitive representation, or migrate the column to nullable"
    )]
    StoreRejectsNull { field: String },

    #[error("index not defined for field '{field}'; add an index or drop `indexed`")]
    MissingIndex { field: String },

    #[error(
        "field '{field}' is indexed in the store but not declared indexed; remove the index or mark the field indexed"
    )]
    UnexpectedIndex { field: String },

    #[error("{}", primary_key_message(.expected, .found))]
    PrimaryKey {
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("missing table '{table}' for link field '{field}'")]
    MissingLinkTable { field: String, table: String },

    #[error("invalid target table for field '{field}': expected '{expected}', found '{found}'")]
    LinkTarget {
        field: String,
        expected: String,
        found: String,
    },

    #[error("target schema '{target}' of field '{field}' needs migration")]
    LinkTargetOutdated { field: String, target: String },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn store_allows_null(field: &str, reason: &NullabilityReason) -> String {
    match reason {
        NullabilityReason::PrimaryKey => format!(
            "field '{field}' accepts null in the store but must not be null because it is a required primary key; drop `required` or migrate the column to not-null"
        ),
        NullabilityReason::Primitive => format!(
            "field '{field}' accepts null in the store but must not be null because it is primitive; use the boxed representation or migrate the column to not-null"
        ),
        NullabilityReason::Required => format!(
            "field '{field}' accepts null in the store but is declared required; drop `required` or migrate the column to not-null"
        ),
    }
}

#[allow(clippy::ref_option)]
fn primary_key_message(expected: &Option<String>, found: &Option<String>) -> String {
    match (expected.as_deref(), found.as_deref()) {
        (Some(expected), None) => format!("primary key not defined for field '{expected}'"),
        (None, Some(found)) => format!("primary key defined for field '{found}' was removed"),
        (Some(expected), Some(found)) => {
            format!("primary key mismatch: expected '{expected}', found '{found}'")
        }
        (None, None) => "primary key mismatch".to_string(),
    }
}
