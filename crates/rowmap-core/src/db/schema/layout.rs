use crate::store::TableKey;
use rowmap_schema::node::{FieldDescriptor, SchemaDescriptor};
use std::sync::Arc;

///
/// ColumnLayout
///
/// Resolved column positions for one validated schema. Built once by
/// validation and read by every copy engine; never mutated.
///

#[derive(Clone, Debug)]
pub struct ColumnLayout {
    pub schema: Arc<SchemaDescriptor>,
    pub table: TableKey,
    pub table_name: String,

    // store column position per descriptor field, in field order
    columns: Vec<usize>,
}

impl ColumnLayout {
    pub(crate) fn new(
        schema: Arc<SchemaDescriptor>,
        table: TableKey,
        table_name: String,
        columns: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(schema.fields.len(), columns.len());

        Self {
            schema,
            table,
            table_name,
            columns,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Fields with their store column, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, usize)> {
        self.schema.fields.iter().zip(self.columns.iter().copied())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<(&FieldDescriptor, usize)> {
        let index = self.schema.field_index(name)?;

        Some((&self.schema.fields[index], self.columns[index]))
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<(&FieldDescriptor, usize)> {
        let index = self.schema.primary_key?;

        Some((&self.schema.fields[index], self.columns[index]))
    }
}
