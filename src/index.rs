//! @dose
//! purpose: Package-wide identity index. Pass one registers every declaration id and the
//!     dotted name it belongs to; pass two only reads it to resolve cross-navigation.
//!
//! when-editing:
//!     - !register is the only mutator and is only called before rendering starts
//!     - !A repeated id is an IdentityCollision and aborts the run
//!     - Names map to the first id registered for them (overloads share a name)
//!
//! invariants:
//!     - Every id in the index is unique
//!     - The name map and the id set stay in sync: every mapped id is in the set
//!
//! do-not:
//!     - Never hand out &mut NodeIndex to the builder
//!
//! gotchas:
//!     - Type expressions in docstrings often omit the package prefix, so resolve also
//!       tries `{module}.{name}`

use crate::error::{ApiStubError, Result};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct NodeIndex {
    /// Every identity id handed out so far
    ids: HashSet<String>,
    /// Dotted declaration name -> identity id
    names: HashMap<String, String>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` for the declaration named `full_name`.
    pub fn register(&mut self, full_name: &str, id: &str) -> Result<()> {
        if !self.ids.insert(id.to_string()) {
            return Err(ApiStubError::IdentityCollision { id: id.to_string() });
        }
        self.names
            .entry(full_name.to_string())
            .or_insert_with(|| id.to_string());
        Ok(())
    }

    /// Find the id for a type name as written, trying it as a full name first and then
    /// relative to `module`.
    pub fn resolve(&self, name: &str, module: &str) -> Option<&str> {
        if let Some(id) = self.names.get(name) {
            return Some(id.as_str());
        }
        if module.is_empty() {
            return None;
        }
        self.names
            .get(&format!("{}.{}", module, name))
            .map(String::as_str)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut index = NodeIndex::new();
        index.register("pkg.sub.Foo", "pkg.sub.Foo").unwrap();
        index.register("pkg.sub.fetch", "pkg.sub.fetch:async").unwrap();

        assert_eq!(index.resolve("pkg.sub.Foo", "other"), Some("pkg.sub.Foo"));
        assert_eq!(index.resolve("Foo", "pkg.sub"), Some("pkg.sub.Foo"));
        assert_eq!(index.resolve("pkg.sub.fetch", ""), Some("pkg.sub.fetch:async"));
        assert_eq!(index.resolve("Bar", "pkg.sub"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_duplicate_id_is_collision() {
        let mut index = NodeIndex::new();
        index.register("pkg.f", "pkg.f").unwrap();
        let err = index.register("pkg.f", "pkg.f").unwrap_err();
        assert!(matches!(err, ApiStubError::IdentityCollision { ref id } if id == "pkg.f"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_first_id_wins_for_shared_name() {
        let mut index = NodeIndex::new();
        index.register("pkg.f", "pkg.f:overload:1").unwrap();
        index.register("pkg.f", "pkg.f:overload:2").unwrap();
        assert_eq!(index.resolve("pkg.f", ""), Some("pkg.f:overload:1"));
        assert!(index.contains_id("pkg.f:overload:2"));
    }
}
