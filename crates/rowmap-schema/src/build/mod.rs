//! Descriptor construction from raw declarations.

mod field;
mod model;

#[cfg(test)]
mod tests;

use crate::{decl::ModelDecl, err, error::ErrorTree, node::SchemaSet};
use std::collections::{BTreeMap, btree_map::Entry};

///
/// Catalog
/// Name lookup over every declaration, abstract ones included.
///

pub(crate) struct Catalog<'a> {
    models: BTreeMap<&'a str, &'a ModelDecl>,
}

impl<'a> Catalog<'a> {
    // Index declarations by name, reporting clashes under the clashing name.
    fn new(models: &'a [ModelDecl], errs: &mut ErrorTree) -> Self {
        let mut map: BTreeMap<&'a str, &'a ModelDecl> = BTreeMap::new();

        for model in models {
            match map.entry(model.name.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(model);
                }
                Entry::Occupied(existing) => {
                    let mut tree = ErrorTree::new();
                    err!(
                        tree,
                        "schema '{}' is declared in both '{}' and '{}'; table names derive from the schema name alone",
                        model.name,
                        existing.get().namespace,
                        model.namespace
                    );
                    errs.add_child(model.name.clone(), tree);
                }
            }
        }

        Self { models: map }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&'a ModelDecl> {
        self.models.get(name).copied()
    }
}

/// Build and validate every concrete model in `models`.
pub(crate) fn build_schema_set(models: &[ModelDecl]) -> Result<SchemaSet, ErrorTree> {
    let mut errs = ErrorTree::new();

    // Phase 1: index declarations so links and backlinks can be resolved.
    let catalog = Catalog::new(models, &mut errs);

    // Phase 2: build each concrete model independently.
    let mut descriptors = Vec::new();
    for model in models.iter().filter(|m| !m.is_abstract) {
        if let Some(desc) = errs.collect(&model.name, model::build_model(model, &catalog)) {
            descriptors.push(desc);
        }
    }

    errs.result()?;

    Ok(SchemaSet::from_descriptors(descriptors))
}
