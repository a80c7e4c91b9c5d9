use crate::{
    build::{
        Catalog,
        field::{BuiltField, build_field},
    },
    decl::ModelDecl,
    err,
    error::ErrorTree,
    node::{FieldDescriptor, SchemaDescriptor},
    validate::naming,
};
use std::collections::BTreeSet;

/// Build one concrete model. Field errors are routed under the field name.
pub(crate) fn build_model(
    model: &ModelDecl,
    catalog: &Catalog<'_>,
) -> Result<SchemaDescriptor, ErrorTree> {
    let mut errs = ErrorTree::new();

    if let Err(msg) = naming::validate_schema_name(&model.name) {
        errs.add(msg);
    }

    let mut fields: Vec<FieldDescriptor> = Vec::new();
    let mut backlinks = Vec::new();
    let mut primary_key: Option<usize> = None;
    let mut seen = BTreeSet::new();
    let mut persistable = 0usize;

    for decl in model.fields.iter().filter(|f| !f.ignored) {
        if !seen.insert(decl.name.as_str()) {
            err!(errs, "field '{}' is declared more than once", decl.name);
            continue;
        }
        if !decl.kind.is_backlink() {
            persistable += 1;
        }

        match errs.collect(&decl.name, build_field(model, decl, catalog)) {
            Some(BuiltField::Column(field)) => {
                if field.primary_key {
                    if let Some(existing) = primary_key {
                        err!(
                            errs,
                            "more than one primary key declared: '{}' and '{}'",
                            fields[existing].name,
                            field.name
                        );
                    } else {
                        primary_key = Some(fields.len());
                    }
                }
                fields.push(field);
            }
            Some(BuiltField::Backlink(backlink)) => backlinks.push(backlink),
            None => {}
        }
    }

    if persistable == 0 {
        err!(
            errs,
            "schema '{}' must contain at least 1 persistable field",
            model.name
        );
    }

    errs.result()?;

    Ok(SchemaDescriptor {
        name: model.name.clone(),
        namespace: model.namespace.clone(),
        fields,
        primary_key,
        backlinks,
    })
}
