use std::{collections::BTreeMap, fmt};

///
/// ErrorTree
///
/// Route-aware error aggregation. Messages belong to the node they were
/// raised on; children are keyed by route segment (model name, field name).
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, Self>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message at this node.
    pub fn add(&mut self, message: impl ToString) {
        self.messages.push(message.to_string());
    }

    /// Merge `tree` under `route`. Empty trees are dropped.
    pub fn add_child(&mut self, route: impl Into<String>, tree: Self) {
        if tree.is_empty() {
            return;
        }

        let entry = self.children.entry(route.into()).or_default();
        entry.merge(tree);
    }

    /// Merge another tree into this node.
    pub fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        for (route, child) in other.children {
            self.add_child(route, child);
        }
    }

    /// Fold a child result into this tree, keeping any error under `route`.
    pub fn collect<T>(&mut self, route: &str, result: Result<T, Self>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(tree) => {
                self.add_child(route, tree);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Total number of messages in this subtree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn child(&self, route: &str) -> Option<&Self> {
        self.children.get(route)
    }

    /// Flatten to `route.path: message` lines in deterministic order.
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<String>) {
        for message in &self.messages {
            if prefix.is_empty() {
                out.push(message.clone());
            } else {
                out.push(format!("{prefix}: {message}"));
            }
        }

        for (route, child) in &self.children {
            let path = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&path, out);
        }
    }

    /// Return `Ok(())` when no error was recorded anywhere in the tree.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.flatten() {
            writeln!(f, "{line}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// Format a message and append it to an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_is_ok() {
        assert!(ErrorTree::new().result().is_ok());
    }

    #[test]
    fn empty_children_are_dropped() {
        let mut tree = ErrorTree::new();
        tree.add_child("Person", ErrorTree::new());

        assert!(tree.child("Person").is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn flatten_prefixes_routes() {
        let mut field = ErrorTree::new();
        field.add("bad type");

        let mut model = ErrorTree::new();
        model.add("no fields");
        model.add_child("age", field);

        let mut root = ErrorTree::new();
        root.add_child("Person", model);

        assert_eq!(root.len(), 2);
        assert_eq!(
            root.flatten(),
            vec![
                "Person: no fields".to_string(),
                "Person.age: bad type".to_string(),
            ]
        );
    }

    #[test]
    fn add_child_merges_same_route() {
        let mut a = ErrorTree::new();
        a.add("first");
        let mut b = ErrorTree::new();
        b.add("second");

        let mut root = ErrorTree::new();
        root.add_child("Dog", a);
        root.add_child("Dog", b);

        let dog = root.child("Dog").expect("merged route should exist");
        assert_eq!(dog.messages(), ["first", "second"]);
    }
}
