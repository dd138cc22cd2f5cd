//! @dose
//! purpose: Core per-declaration model. ArgumentDescriptor is one parameter or return
//!     slot; Signature is the reconciled view of a callable; StructuredComment is what the
//!     docstring parser extracted.
//!
//! when-editing:
//!     - !ArgMap preserves insertion order; rendering order depends on it (keyword-only
//!       slots are sorted explicitly during reconciliation)
//!     - Names are unique within one ArgMap; insert replaces in place
//!
//! invariants:
//!     - A Signature's id is unique across the whole declaration tree
//!     - Descriptors are built once per declaration and read-only after reconciliation
//!
//! gotchas:
//!     - var-positional and var-keyword are single optional slots, not maps

/// Role of one argument slot in a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgRole {
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
    VarPositional,
    VarKeyword,
    Return,
}

impl ArgRole {
    /// Star prefix used when the slot is rendered.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArgRole::VarPositional => "*",
            ArgRole::VarKeyword => "**",
            _ => "",
        }
    }
}

/// Default value of a slot, kept as source text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultValue {
    #[default]
    Missing,
    Present(String),
}

impl DefaultValue {
    pub fn is_present(&self) -> bool {
        matches!(self, DefaultValue::Present(_))
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            DefaultValue::Missing => None,
            DefaultValue::Present(expr) => Some(expr),
        }
    }
}

impl From<Option<String>> for DefaultValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(expr) => DefaultValue::Present(expr),
            None => DefaultValue::Missing,
        }
    }
}

/// One parameter or return slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub role: ArgRole,
    /// Free-form type expression, as written by the author
    pub type_hint: Option<String>,
    pub default: DefaultValue,
}

impl ArgumentDescriptor {
    pub fn new(name: impl Into<String>, role: ArgRole) -> Self {
        Self {
            name: name.into(),
            role,
            type_hint: None,
            default: DefaultValue::Missing,
        }
    }

    pub fn with_type(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = DefaultValue::Present(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        !self.default.is_present()
            && !matches!(self.role, ArgRole::VarPositional | ArgRole::VarKeyword)
    }
}

/// Insertion-ordered name -> descriptor map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgMap {
    entries: Vec<ArgumentDescriptor>,
}

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor; an existing entry with the same name is replaced in place.
    pub fn insert(&mut self, arg: ArgumentDescriptor) {
        match self.entries.iter_mut().find(|a| a.name == arg.name) {
            Some(existing) => *existing = arg,
            None => self.entries.push(arg),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.entries.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ArgumentDescriptor> {
        self.entries.iter_mut().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentDescriptor> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ArgumentDescriptor> {
        self.entries.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorder entries by name. Stable, and only used where output order is alphabetical.
    pub fn sort_by_name(&mut self) {
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub(crate) fn insert_front(&mut self, arg: ArgumentDescriptor) {
        self.entries.retain(|a| a.name != arg.name);
        self.entries.insert(0, arg);
    }
}

impl<'a> IntoIterator for &'a ArgMap {
    type Item = &'a ArgumentDescriptor;
    type IntoIter = std::slice::Iter<'a, ArgumentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Reconciled view of a callable declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Identity id (line id of the declaration)
    pub id: String,
    /// Short display name
    pub name: String,
    /// Dotted name without identity suffixes
    pub full_name: String,
    pub is_async: bool,
    pub is_class_method: bool,
    pub positional_only: ArgMap,
    pub positional_or_keyword: ArgMap,
    pub keyword_only: ArgMap,
    pub var_positional: Option<ArgumentDescriptor>,
    pub var_keyword: Option<ArgumentDescriptor>,
    pub return_arg: Option<ArgumentDescriptor>,
}

impl Signature {
    pub fn return_type(&self) -> Option<&str> {
        self.return_arg
            .as_ref()
            .and_then(|r| r.type_hint.as_deref())
    }

    /// Whether any role of this signature already uses `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.positional_only.contains(name)
            || self.positional_or_keyword.contains(name)
            || self.keyword_only.contains(name)
            || self.var_positional.as_ref().is_some_and(|a| a.name == name)
            || self.var_keyword.as_ref().is_some_and(|a| a.name == name)
    }

    /// Number of layout units: every slot, plus the `/` and `*` markers when rendered.
    pub fn argument_units(&self) -> usize {
        let mut count =
            self.positional_only.len() + self.positional_or_keyword.len() + self.keyword_only.len();
        if !self.positional_only.is_empty() {
            count += 1;
        }
        if self.needs_keyword_marker() {
            count += 1;
        }
        if self.var_positional.is_some() {
            count += 1;
        }
        if self.var_keyword.is_some() {
            count += 1;
        }
        count
    }

    /// A bare `*` is only needed when keyword-only slots exist and `*args` does not
    /// already separate them.
    pub fn needs_keyword_marker(&self) -> bool {
        !self.keyword_only.is_empty() && self.var_positional.is_none()
    }
}

/// Metadata extracted from a docstring. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredComment {
    pub positional: ArgMap,
    pub keyword_only: ArgMap,
    pub instance_vars: ArgMap,
    pub return_type: Option<String>,
}

impl StructuredComment {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
            && self.keyword_only.is_empty()
            && self.instance_vars.is_empty()
            && self.return_type.is_none()
    }

    /// Type recorded for `name`, searching instance vars, then positional, then keyword.
    pub fn type_for(&self, name: &str) -> Option<&str> {
        self.instance_vars
            .get(name)
            .or_else(|| self.positional.get(name))
            .or_else(|| self.keyword_only.get(name))
            .and_then(|a| a.type_hint.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(name: &str, role: ArgRole) -> ArgumentDescriptor {
        ArgumentDescriptor::new(name, role)
    }

    #[test]
    fn test_is_required() {
        assert!(arg("a", ArgRole::PositionalOrKeyword).is_required());
        assert!(!arg("a", ArgRole::KeywordOnly).with_default("1").is_required());
        assert!(!arg("args", ArgRole::VarPositional).is_required());
        assert!(!arg("kwargs", ArgRole::VarKeyword).is_required());
    }

    #[test]
    fn test_arg_map_keeps_order_and_replaces() {
        let mut map = ArgMap::new();
        map.insert(arg("b", ArgRole::KeywordOnly));
        map.insert(arg("a", ArgRole::KeywordOnly));
        map.insert(arg("b", ArgRole::KeywordOnly).with_type("int"));

        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b").unwrap().type_hint.as_deref(), Some("int"));
    }

    #[test]
    fn test_argument_units() {
        let mut sig = Signature::default();
        sig.positional_only.insert(arg("a", ArgRole::PositionalOnly));
        sig.positional_or_keyword
            .insert(arg("b", ArgRole::PositionalOrKeyword));
        sig.keyword_only.insert(arg("c", ArgRole::KeywordOnly));
        // a, /, b, *, c
        assert_eq!(sig.argument_units(), 5);

        sig.var_positional = Some(arg("args", ArgRole::VarPositional));
        // a, /, b, *args, c
        assert_eq!(sig.argument_units(), 5);
        assert!(!sig.needs_keyword_marker());
    }

    #[test]
    fn test_type_for_lookup_order() {
        let mut comment = StructuredComment::default();
        comment
            .positional
            .insert(arg("x", ArgRole::PositionalOrKeyword).with_type("int"));
        comment
            .instance_vars
            .insert(arg("x", ArgRole::PositionalOrKeyword).with_type("str"));
        assert_eq!(comment.type_for("x"), Some("str"));
        assert_eq!(comment.type_for("missing"), None);
    }
}
