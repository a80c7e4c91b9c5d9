use crate::{
    db::Session,
    error::{ErrorOrigin, InternalError},
    obs::sink::{MetricsEvent, record},
    store::{RowStore, TableKey},
};
use tracing::{debug, info};

impl<S: RowStore> Session<S> {
    /// Create the table for `schema`, and for every schema it links to,
    /// when missing. An existing table is returned untouched.
    pub fn synthesize_schema(&mut self, schema: &str) -> Result<TableKey, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| s.synthesize_table(schema))
    }

    // The new table doubles as the in-progress marker: it exists before any
    // link is followed, so a schema reached again through a cycle returns
    // it from the existence check instead of recursing.
    pub(crate) fn synthesize_table(&mut self, schema: &str) -> Result<TableKey, InternalError> {
        let desc = self.descriptor(schema)?;
        let table_name = self.table_name_for(&desc.name);

        if let Some(table) = self.store.table(&table_name) {
            return Ok(table);
        }

        // Phase 1: create the table.
        let table = self.store.get_or_create_table(&table_name)?;
        debug!(schema = %desc.name, table = %table_name, "table created");

        // Phase 2: columns in field order.
        for field in &desc.fields {
            let ty = field.column_type().ok_or_else(|| {
                InternalError::invariant(
                    ErrorOrigin::Schema,
                    format!("field '{}.{}' has no column type", desc.name, field.name),
                )
            })?;

            let column = if ty.is_link() {
                let target = field.target.as_deref().ok_or_else(|| {
                    InternalError::invariant(
                        ErrorOrigin::Schema,
                        format!("link field '{}.{}' has no target", desc.name, field.name),
                    )
                })?;
                let target_table = self.synthesize_table(target)?;

                self.store
                    .add_link_column(table, ty, &field.name, target_table)?
            } else {
                self.store
                    .add_column(table, ty, &field.name, field.nullable)?
            };

            if field.indexed {
                self.store.add_search_index(table, column)?;
            }
        }

        // Phase 3: primary key, or none.
        let pk = desc.primary_key().map(|f| f.name.as_str());
        self.store.set_primary_key(table, pk)?;

        record(MetricsEvent::TableSynthesized { schema: &desc.name });
        info!(schema = %desc.name, table = %table_name, columns = desc.fields.len(), "schema synthesized");

        Ok(table)
    }
}
