use crate::{build::Catalog, decl::FieldDecl, node::BacklinkDescriptor, types::FieldKind};

/// Resolve the target of a link or link-list declaration.
///
/// The target must name a declared, concrete schema.
pub(crate) fn validate_link_target(decl: &FieldDecl, catalog: &Catalog<'_>) -> Result<String, String> {
    let Some(target) = decl.target.as_deref() else {
        return Err(format!("{} field '{}' has no target schema", decl.kind, decl.name));
    };

    match catalog.get(target) {
        None => Err(format!(
            "field '{}' references unknown schema '{target}'",
            decl.name
        )),
        Some(model) if model.is_abstract => Err(format!(
            "only concrete schemas can be linked; field '{}' targets abstract schema '{target}'",
            decl.name
        )),
        Some(_) => Ok(target.to_string()),
    }
}

/// Resolve a backlink declared on `owner`.
///
/// The source must be a link or link-list field of a concrete schema, and
/// it must point back at `owner`.
pub(crate) fn validate_backlink_source(
    owner: &str,
    decl: &FieldDecl,
    catalog: &Catalog<'_>,
) -> Result<BacklinkDescriptor, String> {
    let (Some(source_schema), Some(source_field)) =
        (decl.target.as_deref(), decl.backlink_field.as_deref())
    else {
        return Err(format!(
            "backlink '{}' must name both a source schema and a source field",
            decl.name
        ));
    };

    let Some(source) = catalog.get(source_schema) else {
        return Err(format!(
            "backlink '{}' references unknown schema '{source_schema}'",
            decl.name
        ));
    };
    if source.is_abstract {
        return Err(format!(
            "backlink '{}' references abstract schema '{source_schema}'",
            decl.name
        ));
    }

    let Some(field) = source.get(source_field).filter(|f| !f.ignored) else {
        return Err(format!(
            "backlink '{}' references missing field '{source_schema}.{source_field}'",
            decl.name
        ));
    };

    if !matches!(field.kind, FieldKind::Link | FieldKind::LinkList) {
        return Err(format!(
            "backlink '{}' source '{source_schema}.{source_field}' is a {} field, not a link",
            decl.name, field.kind
        ));
    }

    if field.target.as_deref() != Some(owner) {
        return Err(format!(
            "backlink '{}' source '{source_schema}.{source_field}' does not point at '{owner}'",
            decl.name
        ));
    }

    Ok(BacklinkDescriptor {
        name: decl.name.clone(),
        source_schema: source_schema.to_string(),
        source_field: source_field.to_string(),
    })
}
