use crate::{build::build_schema_set, decl::ModelDecl, error::ErrorTree, node::SchemaDescriptor};
use std::{collections::BTreeMap, sync::Arc};

///
/// SchemaSet
///
/// Closed registry of every concrete schema, keyed by schema name. Built
/// once when a store session opens; link targets are resolved against it
/// instead of inspecting types per call.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    schemas: Vec<Arc<SchemaDescriptor>>,
    by_name: BTreeMap<String, usize>,
}

impl SchemaSet {
    /// Validate every declaration and build the registry.
    ///
    /// A failing model is reported under its own route; the set is only
    /// returned when every concrete model built cleanly.
    pub fn build(models: impl IntoIterator<Item = ModelDecl>) -> Result<Self, ErrorTree> {
        let models: Vec<ModelDecl> = models.into_iter().collect();

        build_schema_set(&models)
    }

    pub(crate) fn from_descriptors(descriptors: Vec<SchemaDescriptor>) -> Self {
        let mut set = Self::default();
        for desc in descriptors {
            set.by_name.insert(desc.name.clone(), set.schemas.len());
            set.schemas.push(Arc::new(desc));
        }

        set
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<SchemaDescriptor>> {
        self.by_name.get(name).map(|&i| &self.schemas[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemaDescriptor>> {
        self.schemas.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
