use crate::{
    db::{
        Session,
        cache::{DetachCache, DetachEntry},
        schema::ColumnLayout,
    },
    error::{ErrorOrigin, InternalError},
    object::{FieldValue, Object, ObjectGraph, ObjectId, ObjectRef},
    obs::sink::{MetricsEvent, record},
    store::{RowRef, RowStore, TableKey},
};
use rowmap_schema::types::FieldKind;
use tracing::debug;

impl<S: RowStore> Session<S> {
    /// Snapshot `row`, and what it links to up to `max_depth` hops away,
    /// into unmanaged objects in `graph`.
    ///
    /// Depth 0 is `row` itself. Links past the limit are left unset; a row
    /// reached more than once becomes one object.
    pub fn create_detached_copy(
        &mut self,
        row: RowRef,
        max_depth: u32,
        graph: &mut ObjectGraph,
    ) -> Result<ObjectId, InternalError> {
        self.check_thread()?;
        self.ensure_local(row, ErrorOrigin::Detach)?;

        self.with_metrics(|s| {
            let mut cache = DetachCache::new();
            let copied = s.detach_row(row, 0, max_depth, graph, &mut cache)?;
            debug!(row = %row, max_depth, objects = cache.len(), "detached copy created");

            copied.ok_or_else(|| {
                InternalError::invariant(ErrorOrigin::Detach, format!("row {row} produced no copy"))
            })
        })
    }

    /// [`Self::create_detached_copy`] with the configured default depth.
    pub fn create_detached_copy_default(
        &mut self,
        row: RowRef,
        graph: &mut ObjectGraph,
    ) -> Result<ObjectId, InternalError> {
        let depth = self.config.default_max_depth;

        self.create_detached_copy(row, depth, graph)
    }

    fn detach_row(
        &mut self,
        row: RowRef,
        depth: u32,
        max_depth: u32,
        graph: &mut ObjectGraph,
        cache: &mut DetachCache,
    ) -> Result<Option<ObjectId>, InternalError> {
        if depth > max_depth {
            return Ok(None);
        }

        // A row first reached deeper than now gets its links refilled, so
        // a diamond ends up as complete as its shortest path allows.
        let cached = cache.get_mut(&row).map(|entry| {
            let refill = depth < entry.min_depth;
            if refill {
                entry.min_depth = depth;
            }
            (entry.object, refill)
        });
        if let Some((object, refill)) = cached {
            if refill {
                let layout = self.layout_for_table(row.table)?;
                self.fill_links(&layout, row, object, depth, max_depth, graph, cache)?;
            }

            return Ok(Some(object));
        }

        let layout = self.layout_for_table(row.table)?;
        let object = graph.insert(Object::new(&layout.schema));
        cache.insert(
            row,
            DetachEntry {
                object,
                min_depth: depth,
            },
        );
        record(MetricsEvent::DetachedCopy {
            schema: layout.name(),
        });

        for (field, column) in layout.fields() {
            if field.is_scalar() {
                let value = self.store.get_value(row.table, row.row, column)?;
                graph
                    .object_mut(object)?
                    .put(&field.name, FieldValue::Value(value));
            }
        }
        self.fill_links(&layout, row, object, depth, max_depth, graph, cache)?;

        Ok(Some(object))
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_links(
        &mut self,
        layout: &ColumnLayout,
        row: RowRef,
        object: ObjectId,
        depth: u32,
        max_depth: u32,
        graph: &mut ObjectGraph,
        cache: &mut DetachCache,
    ) -> Result<(), InternalError> {
        // `None` once the next hop is past the limit.
        let next = depth.checked_add(1).filter(|next| *next <= max_depth);

        for (field, column) in layout.fields() {
            let slot = match field.kind {
                FieldKind::Link => {
                    let target = match (self.store.get_link(row.table, row.row, column)?, next) {
                        (Some(target), Some(next)) => {
                            let table = self.link_table(layout, row, column)?;
                            self.detach_row(row.sibling(table, target), next, max_depth, graph, cache)?
                        }
                        _ => None,
                    };

                    FieldValue::Link(target.map(ObjectRef::Unmanaged))
                }
                FieldKind::LinkList => match next {
                    Some(next) => {
                        let table = self.link_table(layout, row, column)?;
                        let rows = self.store.link_list(row.table, row.row, column)?;
                        let mut items = Vec::with_capacity(rows.len());
                        for target in rows {
                            let copied = self.detach_row(
                                row.sibling(table, target),
                                next,
                                max_depth,
                                graph,
                                cache,
                            )?;
                            items.extend(copied.map(ObjectRef::Unmanaged));
                        }

                        FieldValue::LinkList(Some(items))
                    }
                    None => FieldValue::LinkList(None),
                },
                _ => continue,
            };

            graph.object_mut(object)?.put(&field.name, slot);
        }

        Ok(())
    }

    fn link_table(
        &self,
        layout: &ColumnLayout,
        row: RowRef,
        column: usize,
    ) -> Result<TableKey, InternalError> {
        self.store.link_target(row.table, column)?.ok_or_else(|| {
            InternalError::invariant(
                ErrorOrigin::Detach,
                format!("link column {column} of '{}' has no target table", layout.name()),
            )
        })
    }
}
