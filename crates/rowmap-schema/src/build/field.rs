use crate::{
    build::Catalog,
    decl::{FieldDecl, ModelDecl},
    err,
    error::ErrorTree,
    node::{BacklinkDescriptor, FieldDescriptor},
    types::{FieldKind, Repr},
    validate::{naming, relation},
};

///
/// BuiltField
/// A declaration is either a stored column or a computed backlink.
///

pub(crate) enum BuiltField {
    Column(FieldDescriptor),
    Backlink(BacklinkDescriptor),
}

pub(crate) fn build_field(
    model: &ModelDecl,
    decl: &FieldDecl,
    catalog: &Catalog<'_>,
) -> Result<BuiltField, ErrorTree> {
    let mut errs = ErrorTree::new();

    if let Err(msg) = naming::validate_field_name(&decl.name) {
        errs.add(msg);
    }

    if decl.kind.is_backlink() {
        return build_backlink(model, decl, catalog, errs);
    }

    let mapping = decl.kind.mapping();

    // target
    let target = if decl.kind.is_relation() {
        match relation::validate_link_target(decl, catalog) {
            Ok(target) => Some(target),
            Err(msg) => {
                errs.add(msg);
                None
            }
        }
    } else {
        if decl.target.is_some() {
            err!(errs, "{} field '{}' cannot declare a target schema", decl.kind, decl.name);
        }
        None
    };

    // representation
    if decl.repr == Repr::Primitive && !mapping.primitive {
        err!(
            errs,
            "{} field '{}' has no primitive representation",
            decl.kind,
            decl.name
        );
    }

    // keys and indexes
    if decl.primary_key && !mapping.primary_key {
        err!(
            errs,
            "field '{}' of kind {} cannot be a primary key; only string and integer kinds are supported",
            decl.name,
            decl.kind
        );
    }
    if decl.indexed && !mapping.indexable {
        err!(
            errs,
            "field '{}' of kind {} cannot be indexed",
            decl.name,
            decl.kind
        );
    }

    let nullable = resolve_nullability(decl, &mut errs);

    // default
    if let Some(default) = &decl.default {
        if decl.kind.is_relation() {
            err!(errs, "{} field '{}' cannot declare a default", decl.kind, decl.name);
        } else if default.is_null() && !nullable {
            err!(
                errs,
                "field '{}' does not accept null, so its default cannot be null",
                decl.name
            );
        } else if !default.fits(decl.kind) {
            err!(
                errs,
                "default of type {} does not fit field '{}' of kind {}",
                default.type_label(),
                decl.name,
                decl.kind
            );
        }
    }

    errs.result()?;

    Ok(BuiltField::Column(FieldDescriptor {
        name: decl.name.clone(),
        kind: decl.kind,
        repr: decl.repr,
        nullable,
        indexed: decl.indexed || decl.primary_key,
        primary_key: decl.primary_key,
        target,
        default: decl.default.clone(),
    }))
}

// Links are always nullable and link-lists never are; scalars follow the
// declared representation and the required flag.
fn resolve_nullability(decl: &FieldDecl, errs: &mut ErrorTree) -> bool {
    match decl.kind {
        FieldKind::Link | FieldKind::LinkList => {
            if decl.required {
                err!(
                    errs,
                    "{} field '{}' cannot be required; an absent link is always valid",
                    decl.kind,
                    decl.name
                );
            }
            if decl.nullable && decl.kind.is_link_list() {
                err!(errs, "link-list field '{}' cannot be nullable", decl.name);
            }

            decl.kind.is_link()
        }
        _ => match decl.repr {
            Repr::Primitive => {
                if decl.required {
                    err!(
                        errs,
                        "required is unnecessary on primitive field '{}'; primitives are never null",
                        decl.name
                    );
                }
                if decl.nullable {
                    err!(
                        errs,
                        "primitive field '{}' cannot hold null; use the boxed representation",
                        decl.name
                    );
                }

                false
            }
            Repr::Boxed => {
                if decl.required && decl.nullable {
                    err!(
                        errs,
                        "field '{}' cannot be both required and nullable",
                        decl.name
                    );
                }

                !decl.required
            }
        },
    }
}

fn build_backlink(
    model: &ModelDecl,
    decl: &FieldDecl,
    catalog: &Catalog<'_>,
    mut errs: ErrorTree,
) -> Result<BuiltField, ErrorTree> {
    if decl.primary_key {
        err!(errs, "backlink '{}' cannot be a primary key", decl.name);
    }
    if decl.indexed {
        err!(errs, "backlink '{}' cannot be indexed", decl.name);
    }
    if decl.required {
        err!(errs, "backlink '{}' cannot be required", decl.name);
    }
    if decl.repr == Repr::Primitive {
        err!(errs, "backlink '{}' has no primitive representation", decl.name);
    }
    if decl.default.is_some() {
        err!(errs, "backlink '{}' cannot declare a default", decl.name);
    }

    match relation::validate_backlink_source(&model.name, decl, catalog) {
        Ok(backlink) => {
            errs.result()?;
            Ok(BuiltField::Backlink(backlink))
        }
        Err(msg) => {
            errs.add(msg);
            Err(errs)
        }
    }
}
