use crate::{
    db::{
        Session,
        schema::{
            ColumnLayout, MigrationError, MigrationReport, NullabilityReason, SchemaMismatch,
        },
    },
    error::{ErrorOrigin, InternalError},
    obs::sink::{MetricsEvent, record},
    store::{RowStore, TableKey},
};
use rowmap_schema::node::{FieldDescriptor, SchemaDescriptor};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{info, warn};

///
/// ValidationPass
///
/// State shared by one validation call across every table it reaches.
/// A schema is marked passing when first entered so link cycles resolve.
///

#[derive(Default)]
struct ValidationPass {
    visited: BTreeMap<String, bool>,
    reports: Vec<MigrationReport>,
}

impl ValidationPass {
    fn fail(&mut self, desc: &SchemaDescriptor, table: String, mismatches: Vec<SchemaMismatch>) {
        record(MetricsEvent::MigrationMismatch {
            schema: &desc.name,
            mismatches: mismatches.len() as u64,
        });
        self.visited.insert(desc.name.clone(), false);
        self.reports.push(MigrationReport {
            schema: desc.name.clone(),
            table,
            mismatches,
        });
    }

    fn finish(self) -> Result<(), InternalError> {
        if self.reports.is_empty() {
            Ok(())
        } else {
            Err(InternalError::migration(MigrationError {
                reports: self.reports,
            }))
        }
    }
}

impl<S: RowStore> Session<S> {
    /// Compare the stored table of `schema` (and of every schema it links
    /// to) with its descriptor. Every mismatch is reported, not just the
    /// first.
    pub fn validate_schema(&mut self, schema: &str) -> Result<Arc<ColumnLayout>, InternalError> {
        self.check_thread()?;

        self.with_metrics(|s| s.validate_layout(schema))
    }

    /// Synthesize every missing table, then validate every schema in the
    /// registry, reporting all mismatches of all schemas together.
    pub fn open_schemas(&mut self) -> Result<(), InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            let names: Vec<String> = s.schemas.names().map(str::to_string).collect();

            // Phase 1: create what is missing.
            for name in &names {
                s.synthesize_table(name)?;
            }

            // Phase 2: validate everything.
            let mut pass = ValidationPass::default();
            for name in &names {
                s.check_table(name, &mut pass)?;
            }

            pass.finish()
        })
    }

    pub(crate) fn validate_layout(
        &mut self,
        schema: &str,
    ) -> Result<Arc<ColumnLayout>, InternalError> {
        let mut pass = ValidationPass::default();
        self.check_table(schema, &mut pass)?;
        pass.finish()?;

        self.layouts.get(schema).cloned().ok_or_else(|| {
            InternalError::invariant(
                ErrorOrigin::Schema,
                format!("schema '{schema}' validated without producing a layout"),
            )
        })
    }

    // Returns whether `schema` matches its table. Mismatches land in `pass`;
    // only store failures are returned as errors.
    fn check_table(&mut self, schema: &str, pass: &mut ValidationPass) -> Result<bool, InternalError> {
        if self.layouts.contains_key(schema) {
            return Ok(true);
        }
        if let Some(&ok) = pass.visited.get(schema) {
            return Ok(ok);
        }
        pass.visited.insert(schema.to_string(), true);

        let desc = self.descriptor(schema)?;
        let table_name = self.table_name_for(&desc.name);
        let mut mismatches = Vec::new();

        let Some(table) = self.store.table(&table_name) else {
            mismatches.push(SchemaMismatch::MissingTable {
                table: table_name.clone(),
            });
            pass.fail(&desc, table_name, mismatches);

            return Ok(false);
        };

        // Phase 1: column count.
        let found = self.store.column_count(table)?;
        let expected = desc.len();
        if found < expected {
            mismatches.push(SchemaMismatch::FewerColumns { expected, found });
        } else if found > expected {
            if self.config.allow_extra_columns {
                warn!(
                    schema = %desc.name,
                    table = %table_name,
                    expected,
                    found,
                    "store table has columns no field declares"
                );
            } else {
                mismatches.push(SchemaMismatch::ExtraColumns { expected, found });
            }
        }

        // Phase 2: every declared field.
        let mut by_name = HashMap::with_capacity(found);
        for column in 0..found {
            by_name.insert(self.store.column_name(table, column)?, column);
        }

        let mut columns = Vec::with_capacity(expected);
        for field in &desc.fields {
            let Some(&column) = by_name.get(&field.name) else {
                mismatches.push(SchemaMismatch::MissingColumn {
                    field: field.name.clone(),
                });
                continue;
            };
            columns.push(column);

            self.check_column(field, table, column, pass, &mut mismatches)?;
        }

        // Phase 3: primary key.
        let expected_pk = desc.primary_key().map(|f| f.name.clone());
        let found_pk = self.store.primary_key(table)?;
        if expected_pk != found_pk {
            mismatches.push(SchemaMismatch::PrimaryKey {
                expected: expected_pk,
                found: found_pk,
            });
        }

        if !mismatches.is_empty() {
            pass.fail(&desc, table_name, mismatches);

            return Ok(false);
        }

        let layout = ColumnLayout::new(desc.clone(), table, table_name.clone(), columns);
        self.layouts.insert(desc.name.clone(), Arc::new(layout));
        record(MetricsEvent::SchemaValidated { schema: &desc.name });
        info!(schema = %desc.name, table = %table_name, "schema validated");

        Ok(true)
    }

    fn check_column(
        &mut self,
        field: &FieldDescriptor,
        table: TableKey,
        column: usize,
        pass: &mut ValidationPass,
        mismatches: &mut Vec<SchemaMismatch>,
    ) -> Result<(), InternalError> {
        let Some(expected) = field.column_type() else {
            return Ok(());
        };
        let found = self.store.column_type(table, column)?;
        if found != expected {
            mismatches.push(SchemaMismatch::TypeMismatch {
                field: field.name.clone(),
                expected,
                found,
            });
            return Ok(());
        }

        if expected.is_link() {
            self.check_link(field, table, column, pass, mismatches)?;
        } else {
            let store_nullable = self.store.is_column_nullable(table, column)?;
            if store_nullable && !field.nullable {
                let reason = if field.primary_key {
                    NullabilityReason::PrimaryKey
                } else if field.is_primitive() {
                    NullabilityReason::Primitive
                } else {
                    NullabilityReason::Required
                };
                mismatches.push(SchemaMismatch::StoreAllowsNull {
                    field: field.name.clone(),
                    reason,
                });
            } else if !store_nullable && field.nullable {
                mismatches.push(SchemaMismatch::StoreRejectsNull {
                    field: field.name.clone(),
                });
            }
        }

        let indexed = self.store.has_search_index(table, column)?;
        if field.indexed && !indexed {
            mismatches.push(SchemaMismatch::MissingIndex {
                field: field.name.clone(),
            });
        } else if !field.indexed && indexed {
            mismatches.push(SchemaMismatch::UnexpectedIndex {
                field: field.name.clone(),
            });
        }

        Ok(())
    }

    fn check_link(
        &mut self,
        field: &FieldDescriptor,
        table: TableKey,
        column: usize,
        pass: &mut ValidationPass,
        mismatches: &mut Vec<SchemaMismatch>,
    ) -> Result<(), InternalError> {
        let Some(target) = field.target.as_deref() else {
            return Ok(());
        };
        let expected_table = self.table_name_for(target);

        let Some(target_key) = self.store.table(&expected_table) else {
            mismatches.push(SchemaMismatch::MissingLinkTable {
                field: field.name.clone(),
                table: expected_table,
            });
            return Ok(());
        };

        let found = self.store.link_target(table, column)?;
        if found != Some(target_key) {
            let found = match found {
                Some(key) => self.store.table_name(key)?,
                None => "<none>".to_string(),
            };
            mismatches.push(SchemaMismatch::LinkTarget {
                field: field.name.clone(),
                expected: expected_table,
                found,
            });
            return Ok(());
        }

        if !self.check_table(target, pass)? {
            mismatches.push(SchemaMismatch::LinkTargetOutdated {
                field: field.name.clone(),
                target: target.to_string(),
            });
        }

        Ok(())
    }
}
