use crate::{
    db::{Session, cache::CopyCache, schema::ColumnLayout},
    error::{ErrorOrigin, InternalError},
    object::{FieldValue, ObjectGraph, ObjectId, ObjectRef},
    obs::sink::{MetricsEvent, record},
    store::{RowKey, RowRef, RowStore},
};
use rowmap_schema::{node::FieldDescriptor, types::FieldKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

///
/// CopyPolicy
/// What copy-in does when a row with the same primary key already exists.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CopyPolicy {
    /// Fail with a duplicate-key error.
    #[default]
    Insert,
    /// Reuse the row and overwrite every non-key field.
    InsertOrUpdate,
}

///
/// CopyPass
/// State of one top-level copy call.
///

struct CopyPass<'a> {
    graph: &'a ObjectGraph,
    policy: CopyPolicy,
    cache: CopyCache,

    // Restricts the writes of each listed object to the named fields.
    masks: Option<&'a FieldMasks>,
}

impl CopyPass<'_> {
    fn is_masked(&self, id: ObjectId) -> bool {
        self.masks.is_some_and(|masks| masks.contains_key(&id))
    }

    fn writes(&self, id: ObjectId, field: &FieldDescriptor) -> bool {
        match self.masks.and_then(|masks| masks.get(&id)) {
            Some(names) => names.contains(&field.name),
            None => true,
        }
    }
}

/// Fields each partially described object actually carries.
pub(crate) type FieldMasks = HashMap<ObjectId, BTreeSet<String>>;

impl<S: RowStore> Session<S> {
    /// Copy an unmanaged object, and everything it reaches, into new rows.
    ///
    /// A row of the same store passed as `source` is returned unchanged.
    pub fn copy_to_store(
        &mut self,
        graph: &ObjectGraph,
        source: impl Into<ObjectRef>,
    ) -> Result<RowRef, InternalError> {
        self.copy_one(graph, source.into(), CopyPolicy::Insert)
    }

    /// Like [`Self::copy_to_store`], but rows whose primary key already
    /// exists are updated in place.
    pub fn copy_or_update(
        &mut self,
        graph: &ObjectGraph,
        source: impl Into<ObjectRef>,
    ) -> Result<RowRef, InternalError> {
        self.copy_one(graph, source.into(), CopyPolicy::InsertOrUpdate)
    }

    /// Copy several roots sharing one identity cache, so an object reached
    /// from more than one root still becomes one row.
    pub fn copy_all_to_store<T: Into<ObjectRef>>(
        &mut self,
        graph: &ObjectGraph,
        roots: impl IntoIterator<Item = T>,
    ) -> Result<Vec<RowRef>, InternalError> {
        let roots: Vec<ObjectRef> = roots.into_iter().map(Into::into).collect();

        self.copy_roots(graph, &roots, CopyPolicy::Insert)
    }

    pub fn copy_all_or_update<T: Into<ObjectRef>>(
        &mut self,
        graph: &ObjectGraph,
        roots: impl IntoIterator<Item = T>,
    ) -> Result<Vec<RowRef>, InternalError> {
        let roots: Vec<ObjectRef> = roots.into_iter().map(Into::into).collect();

        self.copy_roots(graph, &roots, CopyPolicy::InsertOrUpdate)
    }

    fn copy_one(
        &mut self,
        graph: &ObjectGraph,
        source: ObjectRef,
        policy: CopyPolicy,
    ) -> Result<RowRef, InternalError> {
        let rows = self.copy_roots(graph, &[source], policy)?;

        rows.into_iter().next().ok_or_else(|| {
            InternalError::invariant(ErrorOrigin::Copy, "copy of one root produced no row")
        })
    }

    fn copy_roots(
        &mut self,
        graph: &ObjectGraph,
        roots: &[ObjectRef],
        policy: CopyPolicy,
    ) -> Result<Vec<RowRef>, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            // Phase 1: check the whole reachable graph before any write.
            let mut seen = HashSet::new();
            for &root in roots {
                s.precheck_ref(graph, root, None, None, &mut seen)?;
            }

            // Phase 2: copy.
            let mut pass = CopyPass {
                graph,
                policy,
                cache: CopyCache::new(),
                masks: None,
            };
            let rows = roots
                .iter()
                .map(|&root| s.copy_ref(&mut pass, root))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(roots = rows.len(), objects = pass.cache.len(), ?policy, "graph copied");

            Ok(rows)
        })
    }

    /// Copy the graph under `id`, writing only the masked fields of every
    /// object in `masks`; columns they skip keep their current value, or
    /// their default on a new row.
    pub(crate) fn copy_masked(
        &mut self,
        graph: &ObjectGraph,
        id: ObjectId,
        policy: CopyPolicy,
        masks: &FieldMasks,
    ) -> Result<RowRef, InternalError> {
        let mut seen = HashSet::new();
        self.precheck_ref(graph, ObjectRef::Unmanaged(id), None, Some(masks), &mut seen)?;

        let mut pass = CopyPass {
            graph,
            policy,
            cache: CopyCache::new(),
            masks: Some(masks),
        };
        let row = self.copy_object(&mut pass, id)?;
        debug!(objects = pass.cache.len(), ?policy, "masked graph copied");

        Ok(row)
    }

    // ------------------------------------------------------------------
    // Precheck
    // ------------------------------------------------------------------

    fn precheck_ref(
        &mut self,
        graph: &ObjectGraph,
        source: ObjectRef,
        expected: Option<&str>,
        masks: Option<&FieldMasks>,
        seen: &mut HashSet<ObjectId>,
    ) -> Result<(), InternalError> {
        let id = match source {
            ObjectRef::Managed(row) => {
                self.ensure_local(row, ErrorOrigin::Copy)?;
                if let Some(expected) = expected {
                    let layout = self.layout(expected)?;
                    if layout.table != row.table {
                        return Err(InternalError::unsupported(
                            ErrorOrigin::Copy,
                            format!("row {row} is not a '{expected}' row"),
                        ));
                    }
                }

                return Ok(());
            }
            ObjectRef::Unmanaged(id) => id,
        };
        if !seen.insert(id) {
            return Ok(());
        }

        let object = graph.object(id)?;
        if let Some(expected) = expected
            && object.schema() != expected
        {
            return Err(InternalError::unsupported(
                ErrorOrigin::Copy,
                format!(
                    "object {id} is a '{}' but the link expects '{expected}'",
                    object.schema()
                ),
            ));
        }

        let layout = self.layout(object.schema())?;
        let mask = masks.and_then(|masks| masks.get(&id));
        for (field, _) in layout.fields() {
            if mask.is_some_and(|names| !names.contains(&field.name)) {
                continue;
            }

            match (field.kind, object.field(&field.name)) {
                (FieldKind::Link, Some(FieldValue::Link(target))) => {
                    if let Some(target) = target {
                        self.precheck_ref(graph, *target, field.target.as_deref(), masks, seen)?;
                    }
                }
                (FieldKind::LinkList, Some(FieldValue::LinkList(items))) => {
                    for item in items.iter().flatten() {
                        self.precheck_ref(graph, *item, field.target.as_deref(), masks, seen)?;
                    }
                }
                (kind, Some(FieldValue::Value(value))) if kind.is_scalar() => {
                    if value.is_null() {
                        if !field.nullable {
                            return Err(InternalError::illegal_null(
                                ErrorOrigin::Copy,
                                layout.name(),
                                &field.name,
                            ));
                        }
                    } else if !value.fits(kind) {
                        return Err(InternalError::unsupported(
                            ErrorOrigin::Copy,
                            format!(
                                "{} value {value} does not fit field '{}.{}' ({kind})",
                                value.type_label(),
                                layout.name(),
                                field.name
                            ),
                        ));
                    }
                }
                _ => {
                    return Err(InternalError::invariant(
                        ErrorOrigin::Copy,
                        format!(
                            "object {id} has no {} slot for field '{}.{}'",
                            field.kind,
                            layout.name(),
                            field.name
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Copy
    // ------------------------------------------------------------------

    fn copy_ref(&mut self, pass: &mut CopyPass<'_>, source: ObjectRef) -> Result<RowRef, InternalError> {
        match source {
            ObjectRef::Managed(row) => Ok(row),
            ObjectRef::Unmanaged(id) => self.copy_object(pass, id),
        }
    }

    fn copy_object(&mut self, pass: &mut CopyPass<'_>, id: ObjectId) -> Result<RowRef, InternalError> {
        if let Some(row) = pass.cache.get(&id) {
            return Ok(*row);
        }

        let graph = pass.graph;
        let object = graph.object(id)?;
        let layout = self.layout(object.schema())?;
        let table = layout.table;

        // Phase 1: resolve the row by primary key, or create one.
        let (row, created) = match layout.primary_key() {
            Some((pk, column)) => {
                let key = object.value(&pk.name).cloned().unwrap_or_default();
                match self.store.find_first(table, column, &key)? {
                    Some(existing) if pass.policy == CopyPolicy::InsertOrUpdate => (existing, false),
                    Some(_) => {
                        return Err(InternalError::duplicate_key(
                            ErrorOrigin::Copy,
                            layout.name(),
                            key.to_string(),
                        ));
                    }
                    None => (self.store.add_empty_row_with_primary_key(table, &key)?, true),
                }
            }
            None => (self.store.add_empty_row(table)?, true),
        };

        // Phase 2: register before any field write so cycles resolve here.
        let row_ref = self.row_ref(table, row);
        pass.cache.insert(id, row_ref);

        if created {
            record(MetricsEvent::RowCreated { schema: layout.name() });
            debug!(schema = %layout.name(), row = %row_ref, "row created");
            if pass.is_masked(id) {
                self.seed_row(&layout, row, |field| pass.writes(id, field))?;
            }
        } else {
            record(MetricsEvent::RowUpdated { schema: layout.name() });
            debug!(schema = %layout.name(), row = %row_ref, "row updated");
        }

        // Phase 3: every non-key field.
        for (field, column) in layout.fields() {
            if field.primary_key || !pass.writes(id, field) {
                continue;
            }

            match object.field(&field.name) {
                Some(FieldValue::Value(value)) => {
                    self.store.set_value(table, row, column, value.clone())?;
                }
                Some(FieldValue::Link(None)) => {
                    if !created {
                        self.store.nullify_link(table, row, column)?;
                    }
                }
                Some(FieldValue::Link(Some(target))) => {
                    let target = self.copy_ref(pass, *target)?;
                    self.store.set_link(table, row, column, target.row)?;
                }
                Some(FieldValue::LinkList(items)) => {
                    if !created {
                        self.store.clear_link_list(table, row, column)?;
                    }
                    for item in items.iter().flatten() {
                        let target = self.copy_ref(pass, *item)?;
                        self.store.append_link(table, row, column, target.row)?;
                    }
                }
                None => {
                    return Err(InternalError::invariant(
                        ErrorOrigin::Copy,
                        format!("object {id} lost field '{}.{}'", layout.name(), field.name),
                    ));
                }
            }
        }

        Ok(row_ref)
    }

    /// Write defaults into a fresh row, and reset its links, for every
    /// field `skip` does not claim.
    pub(crate) fn seed_row(
        &mut self,
        layout: &ColumnLayout,
        row: RowKey,
        skip: impl Fn(&FieldDescriptor) -> bool,
    ) -> Result<(), InternalError> {
        let table = layout.table;

        for (field, column) in layout.fields() {
            if field.primary_key || skip(field) {
                continue;
            }

            match field.kind {
                FieldKind::Link => self.store.nullify_link(table, row, column)?,
                FieldKind::LinkList => self.store.clear_link_list(table, row, column)?,
                _ => {
                    if let Some(default) = &field.default {
                        self.store.set_value(table, row, column, default.clone())?;
                    }
                }
            }
        }

        Ok(())
    }
}
