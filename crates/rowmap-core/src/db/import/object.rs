use crate::{
    db::{
        Session,
        import::{
            coerce::coerce,
            error::{JsonError, describe},
        },
        schema::ColumnLayout,
    },
    error::{ErrorOrigin, InternalError},
    obs::sink::{MetricsEvent, record},
    store::{RowRef, RowStore},
};
use rowmap_schema::{node::FieldDescriptor, types::FieldKind, value::Value};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;
use tracing::debug;

impl<S: RowStore> Session<S> {
    /// Create (or, with `update`, find and overwrite) a row of `schema`
    /// from a JSON object. Nested objects become linked rows.
    ///
    /// Fields the document omits keep their current or default value.
    pub fn import_json_object(
        &mut self,
        schema: &str,
        json: &JsonValue,
        update: bool,
    ) -> Result<RowRef, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            // Phase 1: reject the document before touching the store.
            s.precheck_json(schema, json)?;

            // Phase 2: import.
            s.import_object(schema, json, update)
        })
    }

    /// Import every element of a JSON array, in order.
    pub fn import_json_array(
        &mut self,
        schema: &str,
        items: &[JsonValue],
        update: bool,
    ) -> Result<Vec<RowRef>, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            for item in items {
                s.precheck_json(schema, item)?;
            }

            items
                .iter()
                .map(|item| s.import_object(schema, item, update))
                .collect()
        })
    }

    /// Parse `text` as one JSON object or an array of objects and import it.
    pub fn import_json_str(
        &mut self,
        schema: &str,
        text: &str,
        update: bool,
    ) -> Result<Vec<RowRef>, InternalError> {
        let json: JsonValue = serde_json::from_str(text).map_err(JsonError::syntax)?;

        match &json {
            JsonValue::Array(items) => self.import_json_array(schema, items, update),
            _ => self.import_json_object(schema, &json, update).map(|row| vec![row]),
        }
    }

    fn precheck_json(&mut self, schema: &str, json: &JsonValue) -> Result<(), InternalError> {
        let layout = self.layout(schema)?;
        let map = as_object(&layout, json)?;

        if let Some((pk, _)) = layout.primary_key()
            && !map.contains_key(&pk.name)
        {
            return Err(InternalError::missing_primary_key(layout.name(), &pk.name));
        }

        for (field, _) in layout.fields() {
            let Some(value) = map.get(&field.name) else {
                continue;
            };

            match field.kind {
                FieldKind::Link => {
                    if !value.is_null() {
                        self.precheck_json(target(&layout, field)?, value)?;
                    }
                }
                FieldKind::LinkList => {
                    for item in as_array(&layout, field, value)? {
                        self.precheck_json(target(&layout, field)?, item)?;
                    }
                }
                _ => {
                    scalar(&layout, field, value)?;
                }
            }
        }

        Ok(())
    }

    fn import_object(
        &mut self,
        schema: &str,
        json: &JsonValue,
        update: bool,
    ) -> Result<RowRef, InternalError> {
        let layout = self.layout(schema)?;
        let map = as_object(&layout, json)?;
        let table = layout.table;

        // Links the document sets are written below; row creation leaves
        // them alone.
        let exclude: BTreeSet<&str> = layout
            .fields()
            .filter(|(f, _)| !f.is_scalar() && map.contains_key(&f.name))
            .map(|(f, _)| f.name.as_str())
            .collect();

        // Phase 1: find or create the row.
        let (row, created) = match layout.primary_key() {
            Some((pk, column)) => {
                let key = scalar(&layout, pk, map.get(&pk.name).unwrap_or(&JsonValue::Null))?;
                match self.store.find_first(table, column, &key)? {
                    Some(existing) if update => (existing, false),
                    Some(_) => {
                        return Err(InternalError::duplicate_key(
                            ErrorOrigin::Import,
                            layout.name(),
                            key.to_string(),
                        ));
                    }
                    None => (self.store.add_empty_row_with_primary_key(table, &key)?, true),
                }
            }
            None => (self.store.add_empty_row(table)?, true),
        };
        let row_ref = self.row_ref(table, row);

        if created {
            self.seed_row(&layout, row, |f| exclude.contains(f.name.as_str()))?;
            record(MetricsEvent::RowCreated { schema: layout.name() });
        } else {
            record(MetricsEvent::RowUpdated { schema: layout.name() });
        }

        // Phase 2: every field the document names.
        for (field, column) in layout.fields() {
            if field.primary_key {
                continue;
            }
            let Some(value) = map.get(&field.name) else {
                continue;
            };

            match field.kind {
                FieldKind::Link => {
                    if value.is_null() {
                        self.store.nullify_link(table, row, column)?;
                    } else {
                        let linked = self.import_object(target(&layout, field)?, value, update)?;
                        self.store.set_link(table, row, column, linked.row)?;
                    }
                }
                FieldKind::LinkList => {
                    self.store.clear_link_list(table, row, column)?;
                    for item in as_array(&layout, field, value)? {
                        let linked = self.import_object(target(&layout, field)?, item, update)?;
                        self.store.append_link(table, row, column, linked.row)?;
                    }
                }
                _ => {
                    let value = scalar(&layout, field, value)?;
                    self.store.set_value(table, row, column, value)?;
                }
            }
        }

        record(MetricsEvent::JsonImport { schema: layout.name() });
        debug!(schema = %layout.name(), row = %row_ref, created, "json object imported");

        Ok(row_ref)
    }
}

fn as_object<'a>(
    layout: &ColumnLayout,
    json: &'a JsonValue,
) -> Result<&'a Map<String, JsonValue>, InternalError> {
    json.as_object().ok_or_else(|| {
        JsonError::ExpectedObject {
            schema: layout.name().to_string(),
            found: describe(json),
        }
        .into()
    })
}

// Null reads as an empty list.
pub(crate) fn as_array<'a>(
    layout: &ColumnLayout,
    field: &FieldDescriptor,
    json: &'a JsonValue,
) -> Result<&'a [JsonValue], InternalError> {
    match json {
        JsonValue::Null => Ok(&[][..]),
        JsonValue::Array(items) => Ok(items.as_slice()),
        _ => Err(JsonError::ExpectedArray {
            field: format!("{}.{}", layout.name(), field.name),
            found: describe(json),
        }
        .into()),
    }
}

pub(crate) fn target<'a>(
    layout: &ColumnLayout,
    field: &'a FieldDescriptor,
) -> Result<&'a str, InternalError> {
    field.target.as_deref().ok_or_else(|| {
        InternalError::invariant(
            ErrorOrigin::Import,
            format!("link field '{}.{}' has no target", layout.name(), field.name),
        )
    })
}

/// Coerce one scalar and enforce the field's nullability.
pub(crate) fn scalar(
    layout: &ColumnLayout,
    field: &FieldDescriptor,
    json: &JsonValue,
) -> Result<Value, InternalError> {
    let value = coerce(field.kind, &format!("{}.{}", layout.name(), field.name), json)?;
    if value.is_null() && !field.nullable {
        return Err(InternalError::illegal_null(
            ErrorOrigin::Import,
            layout.name(),
            &field.name,
        ));
    }

    Ok(value)
}
