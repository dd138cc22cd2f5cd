//! @dose
//! purpose: Pass one. Walks the package snapshot in source order, extracts and reconciles
//!     every callable's signature with its docstring, assigns identity ids and fills the
//!     NodeIndex. The result is a reconciled tree that pass two renders without mutation.
//!
//! when-editing:
//!     - !Ids are pure functions of the declaration path and source order; never use
//!       counters that depend on anything else
//!     - !Reflected data always wins; docstring values only fill gaps
//!     - !Every id handed out goes through NodeIndex::register so collisions are caught here
//!
//! invariants:
//!     - `:async` marks coroutine functions, `:overload:{k}` marks the k-th overload stub
//!     - Keyword-only slots are sorted by name once docstring keywords are merged in
//!     - A return type taken from the docstring is already shortened
//!
//! do-not:
//!     - Never overwrite an existing type or default from the signature
//!     - Never add a docstring keyword whose name another role already uses
//!
//! gotchas:
//!     - `__init__` rarely has its own docstring; the class docstring documents it
//!     - `:` cannot appear in a Python identifier, so id suffixes never collide with names
//!
//! flows:
//!     - reconcile_package: modules -> children in source order -> reconcile each function
//!     - reconcile: adopt types/defaults per role -> surface keywords -> return type

use crate::error::Result;
use crate::formatter::type_name::shorten_text;
use crate::index::NodeIndex;
use crate::parser::{parse_docstring, SignatureExtractor};
use crate::types::{
    in_source_order, ArgMap, ArgRole, ArgumentDescriptor, AttributeDecl, ClassDecl,
    Declaration, EnumMemberDecl, FunctionDecl, ModuleDecl, PackageSnapshot, PropertyDecl,
    Signature, StructuredComment,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Suffix appended to the id of an async declaration.
pub const ASYNC_SUFFIX: &str = ":async";

/// One reconciled function or method.
#[derive(Debug, Clone)]
pub struct ReconciledFunction<'a> {
    pub decl: &'a FunctionDecl,
    pub signature: Signature,
    pub decorators: Vec<String>,
    /// 1-based position among same-named overload stubs
    pub overload: Option<usize>,
    /// Module the declaration lives in, for type navigation
    pub module: String,
}

/// Declaration tree after pass one, in source order.
#[derive(Debug, Clone)]
pub enum ReconciledNode<'a> {
    Module {
        decl: &'a ModuleDecl,
        id: String,
        children: Vec<ReconciledNode<'a>>,
    },
    Class {
        decl: &'a ClassDecl,
        id: String,
        module: String,
        /// Docstring `:ivar:` entries not declared as attributes or properties
        instance_vars: ArgMap,
        children: Vec<ReconciledNode<'a>>,
    },
    Function(ReconciledFunction<'a>),
    Property {
        decl: &'a PropertyDecl,
        id: String,
        module: String,
        /// Declared type, else the docstring `:rtype:`
        type_hint: Option<String>,
    },
    Attribute {
        decl: &'a AttributeDecl,
        id: String,
        module: String,
    },
    EnumMember {
        decl: &'a EnumMemberDecl,
        id: String,
    },
}

impl ReconciledNode<'_> {
    pub fn id(&self) -> &str {
        match self {
            ReconciledNode::Module { id, .. }
            | ReconciledNode::Class { id, .. }
            | ReconciledNode::Property { id, .. }
            | ReconciledNode::Attribute { id, .. }
            | ReconciledNode::EnumMember { id, .. } => id,
            ReconciledNode::Function(f) => &f.signature.id,
        }
    }
}

/// Output of pass one.
#[derive(Debug, Clone)]
pub struct ReconciledPackage<'a> {
    pub modules: Vec<ReconciledNode<'a>>,
    pub index: NodeIndex,
}

/// Merge a structured comment into a signature.
pub fn reconcile(mut signature: Signature, comment: &StructuredComment) -> Signature {
    for arg in signature
        .positional_only
        .iter_mut()
        .chain(signature.positional_or_keyword.iter_mut())
    {
        let documented = comment.positional.get(&arg.name);
        adopt(arg, documented);
    }
    for arg in signature.keyword_only.iter_mut() {
        let documented = comment.keyword_only.get(&arg.name);
        adopt(arg, documented);
    }
    for arg in signature
        .var_positional
        .iter_mut()
        .chain(signature.var_keyword.iter_mut())
    {
        let documented = comment.positional.get(&arg.name);
        adopt(arg, documented);
    }

    for extra in comment.keyword_only.iter() {
        if signature.has_name(&extra.name) {
            continue;
        }
        let mut arg = extra.clone();
        arg.role = ArgRole::KeywordOnly;
        signature.keyword_only.insert(arg);
    }
    signature.keyword_only.sort_by_name();

    if signature.return_type().is_none() {
        if let Some(return_type) = comment.return_type.as_deref() {
            let short = shorten_text(return_type);
            if !short.is_empty() {
                signature.return_arg =
                    Some(ArgumentDescriptor::new("return", ArgRole::Return).with_type(short));
            }
        }
    }

    signature
}

fn adopt(arg: &mut ArgumentDescriptor, documented: Option<&ArgumentDescriptor>) {
    let Some(documented) = documented else {
        return;
    };
    if arg.type_hint.is_none() {
        arg.type_hint = documented.type_hint.clone();
    }
    if !arg.default.is_present() {
        arg.default = documented.default.clone();
    }
}

/// Identity id of a callable declared under `parent_id`.
pub fn identity_id(parent_id: &str, name: &str, is_async: bool, overload: Option<usize>) -> String {
    let mut id = format!("{}.{}", parent_id, name);
    if is_async {
        id.push_str(ASYNC_SUFFIX);
    }
    if let Some(k) = overload {
        id.push_str(&format!(":overload:{}", k));
    }
    id
}

/// Whether the decorator list marks an overload stub.
pub fn is_overload(decorators: &[String]) -> bool {
    decorators
        .iter()
        .any(|d| d == "overload" || d == "typing.overload")
}

/// Runs pass one over a whole snapshot.
#[derive(Default)]
pub struct Reconciler {
    extractor: SignatureExtractor,
    index: NodeIndex,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile_package<'a>(
        mut self,
        snapshot: &'a PackageSnapshot,
    ) -> Result<ReconciledPackage<'a>> {
        let mut modules = Vec::new();
        for decl in in_source_order(&snapshot.modules) {
            match decl {
                Declaration::Module(module) => modules.push(self.module(module)?),
                other => debug!(name = other.name(), "skipping non-module at package root"),
            }
        }
        info!(
            package = %snapshot.package_name,
            ids = self.index.len(),
            "reconciled package"
        );
        Ok(ReconciledPackage {
            modules,
            index: self.index,
        })
    }

    fn module<'a>(&mut self, decl: &'a ModuleDecl) -> Result<ReconciledNode<'a>> {
        let id = decl.name.clone();
        self.index.register(&decl.name, &id)?;
        let children = self.children(&decl.children, &id, &decl.name, None)?;
        Ok(ReconciledNode::Module { decl, id, children })
    }

    fn class<'a>(
        &mut self,
        decl: &'a ClassDecl,
        parent_id: &str,
        module: &str,
    ) -> Result<ReconciledNode<'a>> {
        let id = format!("{}.{}", parent_id, decl.name);
        self.index.register(&id, &id)?;

        let comment = decl
            .docstring
            .as_deref()
            .map(|d| parse_docstring(&id, d))
            .unwrap_or_default();

        let mut instance_vars = ArgMap::new();
        for ivar in comment.instance_vars.iter() {
            let declared = decl.children.iter().any(|c| {
                matches!(c, Declaration::Attribute(_) | Declaration::Property(_))
                    && c.name() == ivar.name
            });
            if !declared {
                self.member_id(&id, &ivar.name)?;
                instance_vars.insert(ivar.clone());
            }
        }

        let children = self.children(&decl.children, &id, module, decl.docstring.as_deref())?;
        Ok(ReconciledNode::Class {
            decl,
            id,
            module: module.to_string(),
            instance_vars,
            children,
        })
    }

    fn children<'a>(
        &mut self,
        children: &'a [Declaration],
        parent_id: &str,
        module: &str,
        class_docstring: Option<&str>,
    ) -> Result<Vec<ReconciledNode<'a>>> {
        let mut overloads: HashMap<&'a str, usize> = HashMap::new();
        let mut out = Vec::with_capacity(children.len());

        for child in in_source_order(children) {
            let node = match child {
                Declaration::Module(m) => self.module(m)?,
                Declaration::Class(c) => self.class(c, parent_id, module)?,
                Declaration::Function(f) => ReconciledNode::Function(self.function(
                    f,
                    parent_id,
                    module,
                    class_docstring,
                    &mut overloads,
                )?),
                Declaration::Property(p) => {
                    let id = self.member_id(parent_id, &p.name)?;
                    let type_hint = p.type_hint.clone().or_else(|| {
                        p.docstring
                            .as_deref()
                            .and_then(|d| parse_docstring(&id, d).return_type)
                    });
                    ReconciledNode::Property {
                        decl: p,
                        id,
                        module: module.to_string(),
                        type_hint,
                    }
                }
                Declaration::Attribute(a) => {
                    let id = self.member_id(parent_id, &a.name)?;
                    ReconciledNode::Attribute {
                        decl: a,
                        id,
                        module: module.to_string(),
                    }
                }
                Declaration::EnumMember(e) => {
                    let id = self.member_id(parent_id, &e.name)?;
                    ReconciledNode::EnumMember { decl: e, id }
                }
            };
            out.push(node);
        }
        Ok(out)
    }

    fn member_id(&mut self, parent_id: &str, name: &str) -> Result<String> {
        let id = format!("{}.{}", parent_id, name);
        self.index.register(&id, &id)?;
        Ok(id)
    }

    fn function<'a>(
        &mut self,
        decl: &'a FunctionDecl,
        parent_id: &str,
        module: &str,
        class_docstring: Option<&str>,
        overloads: &mut HashMap<&'a str, usize>,
    ) -> Result<ReconciledFunction<'a>> {
        let full_name = format!("{}.{}", parent_id, decl.name);
        let extracted = self.extractor.extract(&full_name, decl);

        let overload = if is_overload(&extracted.decorators) {
            let k = overloads.entry(decl.name.as_str()).or_insert(0);
            *k += 1;
            Some(*k)
        } else {
            None
        };
        let id = identity_id(parent_id, &decl.name, extracted.signature.is_async, overload);

        let docstring = match decl.docstring.as_deref() {
            Some(d) if !d.trim().is_empty() => Some(d),
            _ if decl.name == "__init__" => class_docstring,
            _ => None,
        };
        let comment = docstring
            .map(|d| parse_docstring(&id, d))
            .unwrap_or_default();

        let mut signature = reconcile(extracted.signature, &comment);
        signature.id = id;
        signature.full_name = full_name;
        self.index.register(&signature.full_name, &signature.id)?;
        debug!(id = %signature.id, origin = ?extracted.origin, "reconciled function");

        Ok(ReconciledFunction {
            decl,
            signature,
            decorators: extracted.decorators,
            overload,
            module: module.to_string(),
        })
    }
}

/// Pass one over `snapshot`.
pub fn reconcile_package(snapshot: &PackageSnapshot) -> Result<ReconciledPackage<'_>> {
    Reconciler::new().reconcile_package(snapshot)
}
