use crate::{
    db::{Session, schema::ColumnLayout},
    error::{ErrorOrigin, InternalError},
    store::{RowKey, RowRef, RowStore, TableKey},
};
use rowmap_schema::{node::FieldDescriptor, types::FieldKind, value::Value};
use std::sync::Arc;

impl<S: RowStore> Session<S> {
    /// Scalar value of `field` on a managed row.
    pub fn get_value(&mut self, row: RowRef, field: &str) -> Result<Value, InternalError> {
        let (layout, column) = self.resolve_field(row, field, |f| f.is_scalar())?;

        self.store
            .get_value(layout.table, row.row, column)
            .map_err(InternalError::from)
    }

    /// Target of a link field, if set.
    pub fn get_link(&mut self, row: RowRef, field: &str) -> Result<Option<RowRef>, InternalError> {
        let (layout, column) = self.resolve_field(row, field, |f| f.is_link())?;
        let target_table = self.target_table(&layout, field)?;

        let target = self.store.get_link(layout.table, row.row, column)?;

        Ok(target.map(|target| row.sibling(target_table, target)))
    }

    /// Members of a link-list field, in order.
    pub fn get_link_list(&mut self, row: RowRef, field: &str) -> Result<Vec<RowRef>, InternalError> {
        let (layout, column) = self.resolve_field(row, field, |f| f.is_link_list())?;
        let target_table = self.target_table(&layout, field)?;

        let rows = self.store.link_list(layout.table, row.row, column)?;

        Ok(rows
            .into_iter()
            .map(|target| row.sibling(target_table, target))
            .collect())
    }

    /// Rows of the backlink's source schema whose link or link-list points
    /// at `row`, in row order.
    pub fn linking_rows(&mut self, row: RowRef, backlink: &str) -> Result<Vec<RowRef>, InternalError> {
        self.check_thread()?;
        self.ensure_local(row, ErrorOrigin::Session)?;

        let layout = self.layout_for_table(row.table)?;
        let desc = layout.schema.backlink(backlink).cloned().ok_or_else(|| {
            InternalError::not_found(
                ErrorOrigin::Session,
                format!("schema '{}' has no backlink '{backlink}'", layout.name()),
            )
        })?;

        let source = self.layout(&desc.source_schema)?;
        let (field, column) = source.field(&desc.source_field).ok_or_else(|| {
            InternalError::invariant(
                ErrorOrigin::Session,
                format!(
                    "backlink '{}.{backlink}' names missing field '{}.{}'",
                    layout.name(),
                    desc.source_schema,
                    desc.source_field
                ),
            )
        })?;
        let kind = field.kind;

        let mut rows = Vec::new();
        for index in 0..self.store.row_count(source.table)? {
            let candidate = RowKey(index);
            let links = match kind {
                FieldKind::Link => {
                    self.store.get_link(source.table, candidate, column)? == Some(row.row)
                }
                FieldKind::LinkList => self
                    .store
                    .link_list(source.table, candidate, column)?
                    .contains(&row.row),
                _ => false,
            };
            if links {
                rows.push(row.sibling(source.table, candidate));
            }
        }

        Ok(rows)
    }

    pub fn row_count(&mut self, schema: &str) -> Result<usize, InternalError> {
        self.check_thread()?;
        let layout = self.layout(schema)?;

        Ok(self.store.row_count(layout.table)?)
    }

    /// Row of `schema` whose primary key equals `key`.
    pub fn find_by_primary_key(
        &mut self,
        schema: &str,
        key: impl Into<Value>,
    ) -> Result<Option<RowRef>, InternalError> {
        self.check_thread()?;
        let layout = self.layout(schema)?;
        let (_, column) = layout.primary_key().ok_or_else(|| {
            InternalError::unsupported(
                ErrorOrigin::Session,
                format!("schema '{schema}' has no primary key"),
            )
        })?;

        let found = self.store.find_first(layout.table, column, &key.into())?;

        Ok(found.map(|row| self.row_ref(layout.table, row)))
    }

    fn resolve_field(
        &mut self,
        row: RowRef,
        field: &str,
        accepts: impl Fn(&FieldDescriptor) -> bool,
    ) -> Result<(Arc<ColumnLayout>, usize), InternalError> {
        self.check_thread()?;
        self.ensure_local(row, ErrorOrigin::Session)?;

        let layout = self.layout_for_table(row.table)?;
        let (desc, column) = layout.field(field).ok_or_else(|| {
            InternalError::not_found(
                ErrorOrigin::Session,
                format!("schema '{}' has no field '{field}'", layout.name()),
            )
        })?;
        if !accepts(desc) {
            return Err(InternalError::unsupported(
                ErrorOrigin::Session,
                format!("field '{}.{field}' is a {} field", layout.name(), desc.kind),
            ));
        }

        Ok((layout, column))
    }

    fn target_table(
        &mut self,
        layout: &ColumnLayout,
        field: &str,
    ) -> Result<TableKey, InternalError> {
        let target = layout
            .schema
            .field(field)
            .and_then(|f| f.target.clone())
            .ok_or_else(|| {
                InternalError::invariant(
                    ErrorOrigin::Session,
                    format!("link field '{}.{field}' has no target", layout.name()),
                )
            })?;

        Ok(self.layout(&target)?.table)
    }
}
