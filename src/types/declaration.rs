//! @dose
//! purpose: Frozen declaration descriptors produced by the collector and read from a JSON
//!     package snapshot. Nothing here is mutated after loading.
//!
//! when-editing:
//!     - !source_order is required on every declaration; siblings render in that order
//!     - !Field names are the collector's wire contract; rename with serde attributes only
//!     - Optional fields default to absent so older snapshots keep loading
//!
//! invariants:
//!     - Module names are fully dotted; every other name is a single identifier
//!     - A function's decorators may be given with or without the leading @
//!
//! gotchas:
//!     - `source` is the raw (possibly indented) def text; it may be missing for builtins
//!       and C extensions, which is why `parameters` exists
//!     - EnumValue is untagged, so a JSON string stays a string and 1 stays a number

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root of a collected package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub package_name: String,
    #[serde(default)]
    pub package_version: String,
    pub modules: Vec<Declaration>,
}

impl PackageSnapshot {
    pub fn from_json(content: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// One declaration in the subject package.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Module(ModuleDecl),
    Class(ClassDecl),
    Function(FunctionDecl),
    Property(PropertyDecl),
    Attribute(AttributeDecl),
    EnumMember(EnumMemberDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Module(d) => &d.name,
            Declaration::Class(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::Property(d) => &d.name,
            Declaration::Attribute(d) => &d.name,
            Declaration::EnumMember(d) => &d.name,
        }
    }

    pub fn source_order(&self) -> u32 {
        match self {
            Declaration::Module(d) => d.source_order,
            Declaration::Class(d) => d.source_order,
            Declaration::Function(d) => d.source_order,
            Declaration::Property(d) => d.source_order,
            Declaration::Attribute(d) => d.source_order,
            Declaration::EnumMember(d) => d.source_order,
        }
    }
}

/// Sort siblings by their declared source order. Stable, so equal orders keep input order.
pub fn in_source_order(children: &[Declaration]) -> Vec<&Declaration> {
    let mut ordered: Vec<&Declaration> = children.iter().collect();
    ordered.sort_by_key(|d| d.source_order());
    ordered
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// Fully dotted module name (e.g. "azure.storage.blob")
    pub name: String,
    pub source_order: u32,
    #[serde(default)]
    pub children: Vec<Declaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub source_order: u32,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub cross_language_id: Option<String>,
    #[serde(default)]
    pub children: Vec<Declaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub source_order: u32,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Parameters as reported by runtime reflection
    #[serde(default)]
    pub parameters: Vec<ReflectedParameter>,
    #[serde(default)]
    pub return_annotation: Option<String>,
    /// Raw `def` source text, when the collector could locate it
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub cross_language_id: Option<String>,
}

/// Strip the leading `@` and surrounding whitespace from a decorator.
pub fn normalize_decorator(decorator: &str) -> &str {
    decorator.trim().trim_start_matches('@').trim()
}

/// Reflected parameter kind, mirroring Python's inspect.Parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedParameter {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default)]
    pub annotation: Option<String>,
    /// Default value as source text
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub source_order: u32,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default = "default_true")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    pub source_order: u32,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub is_class_var: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumMemberDecl {
    pub name: String,
    pub source_order: u32,
    pub value: EnumValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

fn default_true() -> bool {
    true
}
