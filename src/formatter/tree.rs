//! @dose
//! purpose: Pass two. Renders the reconciled declaration tree into review Lines: one Line
//!     per declaration with child Lines for class members and multi-line parameter lists.
//!
//! when-editing:
//!     - !The NodeIndex is borrowed shared; rendering never registers anything
//!     - !Decorator lines carry no id and point at the declaration line that follows them
//!     - !Every unit except the last gets a trailing comma, in both layouts
//!     - Layout is decided by argument units, not by rendered width
//!
//! invariants:
//!     - Line ids are unique across the whole rendered tree (checked by validate_line_ids)
//!     - A class's child lines end with exactly one context-end line
//!     - A blank line follows every function and class
//!
//! do-not:
//!     - Never share a token buffer between declarations; each gets its own SignatureWriter
//!
//! gotchas:
//!     - With `*args` present the bare `*` marker is not emitted and not counted
//!     - Module-level functions show their dotted name, methods only their short name
//!
//! flows:
//!     - render: modules -> children -> class members / function signatures
//!     - function: decorator lines -> SignatureWriter (open, units, close, finish) -> blank

use crate::error::{ApiStubError, Result};
use crate::formatter::type_name::TypeNameShortener;
use crate::index::NodeIndex;
use crate::reconcile::{ReconciledFunction, ReconciledNode};
use crate::types::{
    normalize_decorator, ArgMap, ArgumentDescriptor, AttributeDecl, ClassDecl, EnumMemberDecl,
    EnumValue, Line, ModuleDecl, PropertyDecl, Signature, Token,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Layout and id options for pass two.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Largest number of argument units kept on a single line
    pub multi_line_threshold: usize,
    /// Declaration id -> cross-language id, overriding the snapshot's value
    pub cross_language_ids: HashMap<String, String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            multi_line_threshold: 2,
            cross_language_ids: HashMap::new(),
        }
    }
}

/// One rendered slot of a parameter list.
#[derive(Debug, Clone, Copy)]
pub enum ArgUnit<'s> {
    Arg(&'s ArgumentDescriptor),
    /// `/`
    PositionalMarker,
    /// bare `*`
    KeywordMarker,
}

/// Argument units of `signature` in rendering order.
pub fn argument_units(signature: &Signature) -> Vec<ArgUnit<'_>> {
    let mut units: Vec<ArgUnit> = signature.positional_only.iter().map(ArgUnit::Arg).collect();
    if !signature.positional_only.is_empty() {
        units.push(ArgUnit::PositionalMarker);
    }
    units.extend(signature.positional_or_keyword.iter().map(ArgUnit::Arg));
    if let Some(var) = &signature.var_positional {
        units.push(ArgUnit::Arg(var));
    }
    if signature.needs_keyword_marker() {
        units.push(ArgUnit::KeywordMarker);
    }
    units.extend(signature.keyword_only.iter().map(ArgUnit::Arg));
    if let Some(var) = &signature.var_keyword {
        units.push(ArgUnit::Arg(var));
    }
    units
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamScope {
    NotOpened,
    Open,
    Closed,
}

/// Accumulates the Line for one callable declaration.
///
/// Single-line layout appends every unit to the header tokens. Multi-line layout ends the
/// header at `(` and turns each unit into a child Line.
#[derive(Debug)]
pub struct SignatureWriter {
    id: String,
    multi_line: bool,
    header: Vec<Token>,
    children: Vec<Line>,
    scope: ParamScope,
}

impl SignatureWriter {
    pub fn new(id: impl Into<String>, multi_line: bool, header: Vec<Token>) -> Self {
        Self {
            id: id.into(),
            multi_line,
            header,
            children: Vec::new(),
            scope: ParamScope::NotOpened,
        }
    }

    pub fn open_params(&mut self) -> Result<()> {
        if self.scope != ParamScope::NotOpened {
            return Err(self.unbalanced("parameter list opened twice"));
        }
        self.header.push(Token::punctuation("(").no_suffix_space());
        self.scope = ParamScope::Open;
        Ok(())
    }

    /// Add one unit. `line_id` is only used by the multi-line layout; units without one
    /// are related to the declaration line instead.
    pub fn unit(&mut self, tokens: Vec<Token>, line_id: Option<String>) -> Result<()> {
        if self.scope != ParamScope::Open {
            return Err(self.unbalanced("unit written outside a parameter list"));
        }
        if self.multi_line {
            let line = match line_id {
                Some(id) => Line::with_id(tokens, id),
                None => Line::new(tokens).related_to(&self.id),
            };
            self.children.push(line);
        } else {
            self.header.extend(tokens);
        }
        Ok(())
    }

    pub fn close_params(&mut self, return_type: Vec<Token>) -> Result<()> {
        if self.scope != ParamScope::Open {
            return Err(self.unbalanced("closing a parameter list that was never opened"));
        }
        let has_return = !return_type.is_empty();
        let mut tokens = vec![Token::punctuation(")").no_suffix_space()];
        if has_return {
            tokens.push(Token::punctuation("->").with_prefix_space());
            tokens.extend(return_type);
        }

        if self.multi_line {
            let line = if has_return {
                Line::with_id(tokens, format!("{}.returntype", self.id))
            } else {
                Line::new(tokens).related_to(&self.id)
            };
            self.children.push(line);
        } else {
            self.header.extend(tokens);
        }
        self.scope = ParamScope::Closed;
        Ok(())
    }

    pub fn finish(self) -> Result<Line> {
        if self.scope != ParamScope::Closed {
            return Err(self.unbalanced("declaration finished with an open parameter list"));
        }
        let mut line = Line::with_id(self.header, self.id);
        line.children = self.children;
        Ok(line)
    }

    fn unbalanced(&self, detail: &str) -> ApiStubError {
        ApiStubError::UnbalancedStructure {
            id: self.id.clone(),
            detail: detail.to_string(),
        }
    }
}

/// Renders reconciled declarations into review lines.
pub struct TokenTreeBuilder<'a> {
    index: &'a NodeIndex,
    options: &'a RenderOptions,
}

impl<'a> TokenTreeBuilder<'a> {
    pub fn new(index: &'a NodeIndex, options: &'a RenderOptions) -> Self {
        Self { index, options }
    }

    pub fn render(&self, modules: &[ReconciledNode]) -> Result<Vec<Line>> {
        let mut lines = Vec::new();
        for node in modules {
            self.render_node(node, false, &mut lines)?;
        }
        validate_line_ids(&lines)?;
        Ok(lines)
    }

    fn render_node(&self, node: &ReconciledNode, in_class: bool, out: &mut Vec<Line>) -> Result<()> {
        match node {
            ReconciledNode::Module { decl, id, children } => {
                let mut line = self.module_line(decl, id);
                for child in children {
                    self.render_node(child, false, &mut line.children)?;
                }
                out.push(line);
                out.push(Line::blank());
            }
            ReconciledNode::Class {
                decl,
                id,
                module,
                instance_vars,
                children,
            } => {
                for decorator in &decl.decorators {
                    out.push(decorator_line(normalize_decorator(decorator), id, false));
                }
                let mut line = self.class_line(decl, id, module);
                line.children
                    .extend(self.instance_var_lines(instance_vars, id, module));
                for child in children {
                    self.render_node(child, true, &mut line.children)?;
                }
                line.children.push(Line::context_end());
                out.push(line);
                out.push(Line::blank());
            }
            ReconciledNode::Function(function) => {
                out.extend(self.function_lines(function, in_class)?);
                out.push(Line::blank().hidden(function.decl.hidden));
            }
            ReconciledNode::Property {
                decl,
                id,
                module,
                type_hint,
            } => {
                out.push(self.property_line(decl, type_hint.as_deref(), id, module));
            }
            ReconciledNode::Attribute { decl, id, module } => {
                out.push(self.attribute_line(decl, id, module));
            }
            ReconciledNode::EnumMember { decl, id } => {
                out.push(enum_member_line(decl, id));
            }
        }
        Ok(())
    }

    fn module_line(&self, decl: &ModuleDecl, id: &str) -> Line {
        Line::with_id(
            vec![
                Token::keyword("namespace"),
                Token::text(&decl.name)
                    .no_suffix_space()
                    .navigable(&decl.name, "namespace"),
            ],
            id,
        )
    }

    fn class_line(&self, decl: &ClassDecl, id: &str, module: &str) -> Line {
        let shortener = TypeNameShortener::new(self.index, module);
        let render_class = if decl.is_enum { "enum" } else { "class" };
        let mut tokens = vec![
            Token::keyword("class"),
            Token::text(&decl.name)
                .no_suffix_space()
                .navigable(&decl.name, render_class),
        ];
        if !decl.bases.is_empty() {
            tokens.push(Token::punctuation("(").no_suffix_space());
            for (i, base) in decl.bases.iter().enumerate() {
                if i > 0 {
                    tokens.push(Token::punctuation(","));
                }
                tokens.extend(shortener.tokens(base));
            }
            tokens.push(Token::punctuation(")").no_suffix_space());
        }
        tokens.push(Token::punctuation(":"));

        let mut line = Line::with_id(tokens, id);
        line.cross_language_id = self.cross_language_id(id, decl.cross_language_id.as_deref());
        line
    }

    fn instance_var_lines(&self, ivars: &ArgMap, class_id: &str, module: &str) -> Vec<Line> {
        let shortener = TypeNameShortener::new(self.index, module);
        ivars
            .iter()
            .map(|ivar| {
                let mut tokens = vec![
                    Token::keyword("ivar"),
                    Token::text(&ivar.name).no_suffix_space(),
                ];
                if let Some(type_hint) = ivar.type_hint.as_deref() {
                    tokens.push(Token::punctuation(":"));
                    tokens.extend(shortener.tokens(type_hint));
                }
                Line::with_id(tokens, format!("{}.{}", class_id, ivar.name))
            })
            .collect()
    }

    fn attribute_line(&self, decl: &AttributeDecl, id: &str, module: &str) -> Line {
        let shortener = TypeNameShortener::new(self.index, module);
        let keyword = if decl.is_class_var { "cvar" } else { "ivar" };
        let mut tokens = vec![
            Token::keyword(keyword),
            Token::text(&decl.name).no_suffix_space(),
        ];
        if let Some(type_hint) = decl.type_hint.as_deref() {
            tokens.push(Token::punctuation(":"));
            tokens.extend(shortener.tokens(type_hint));
        }
        if let Some(default) = decl.default.as_deref() {
            tokens.push(Token::punctuation("=").with_prefix_space());
            tokens.push(value_token(default));
        }
        Line::with_id(tokens, id)
    }

    fn property_line(
        &self,
        decl: &PropertyDecl,
        type_hint: Option<&str>,
        id: &str,
        module: &str,
    ) -> Line {
        let shortener = TypeNameShortener::new(self.index, module);
        let mut tokens = vec![
            Token::keyword("property"),
            Token::text(&decl.name).no_suffix_space(),
        ];
        if let Some(type_hint) = type_hint {
            tokens.push(Token::punctuation(":"));
            tokens.extend(shortener.tokens(type_hint));
        }
        if decl.read_only {
            tokens.push(Token::text("# Read-only").with_prefix_space());
        }
        Line::with_id(tokens, id)
    }

    fn function_lines(&self, function: &ReconciledFunction, in_class: bool) -> Result<Vec<Line>> {
        let signature = &function.signature;
        let hidden = function.decl.hidden;
        let shortener = TypeNameShortener::new(self.index, &function.module);

        let mut lines: Vec<Line> = function
            .decorators
            .iter()
            .map(|d| decorator_line(d, &signature.id, hidden))
            .collect();

        let mut header = Vec::new();
        if signature.is_async {
            header.push(Token::keyword("async"));
        }
        header.push(Token::keyword("def"));
        let display = if in_class {
            &signature.name
        } else {
            &signature.full_name
        };
        header.push(Token::text(display).no_suffix_space());

        let units = argument_units(signature);
        let multi_line = units.len() > self.options.multi_line_threshold;
        debug!(id = %signature.id, units = units.len(), multi_line, "rendering function");

        let mut writer = SignatureWriter::new(&signature.id, multi_line, header);
        writer.open_params()?;
        let last = units.len().saturating_sub(1);
        for (i, unit) in units.iter().enumerate() {
            let (mut tokens, line_id) = match unit {
                ArgUnit::Arg(arg) => (
                    self.argument_tokens(arg, &shortener),
                    Some(format!("{}.param({})", signature.id, arg.name)),
                ),
                ArgUnit::PositionalMarker => (vec![Token::text("/").no_suffix_space()], None),
                ArgUnit::KeywordMarker => (vec![Token::text("*").no_suffix_space()], None),
            };
            if i < last {
                tokens.push(Token::punctuation(","));
            }
            writer.unit(tokens, line_id)?;
        }
        let return_tokens = signature
            .return_type()
            .map(|r| shortener.tokens(r))
            .unwrap_or_default();
        writer.close_params(return_tokens)?;

        let mut line = writer.finish()?.hidden(hidden);
        line.cross_language_id =
            self.cross_language_id(&signature.id, function.decl.cross_language_id.as_deref());
        lines.push(line);
        Ok(lines)
    }

    fn argument_tokens(&self, arg: &ArgumentDescriptor, shortener: &TypeNameShortener) -> Vec<Token> {
        let mut tokens = vec![Token::text(format!("{}{}", arg.role.prefix(), arg.name)).no_suffix_space()];
        if let Some(type_hint) = arg.type_hint.as_deref() {
            tokens.push(Token::punctuation(":"));
            tokens.extend(shortener.tokens(type_hint));
        }
        if let Some(default) = arg.default.as_deref() {
            tokens.push(Token::punctuation("=").with_prefix_space());
            tokens.push(value_token(default));
        }
        tokens
    }

    fn cross_language_id(&self, id: &str, declared: Option<&str>) -> Option<String> {
        self.options
            .cross_language_ids
            .get(id)
            .cloned()
            .or_else(|| declared.map(str::to_string))
    }
}

fn decorator_line(decorator: &str, related_to: &str, hidden: bool) -> Line {
    Line::new(vec![Token::keyword(format!("@{}", decorator)).no_suffix_space()])
        .related_to(related_to)
        .hidden(hidden)
}

fn enum_member_line(decl: &EnumMemberDecl, id: &str) -> Line {
    let value = match &decl.value {
        EnumValue::String(s) => Token::string_literal(format!("\"{}\"", s)),
        EnumValue::Number(n) => Token::literal(n.to_string()),
        EnumValue::Bool(true) => Token::literal("True"),
        EnumValue::Bool(false) => Token::literal("False"),
    };
    Line::with_id(
        vec![
            Token::text(&decl.name).no_suffix_space(),
            Token::punctuation("=").with_prefix_space(),
            value,
        ],
        id,
    )
}

/// Default or constant expression as a single token.
fn value_token(expr: &str) -> Token {
    let quoted = expr.len() >= 2
        && ((expr.starts_with('"') && expr.ends_with('"'))
            || (expr.starts_with('\'') && expr.ends_with('\'')));
    if quoted {
        Token::string_literal(expr)
    } else {
        Token::literal(expr)
    }
}

/// Check that no line id occurs twice anywhere in the tree.
pub fn validate_line_ids(lines: &[Line]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicate: Option<String> = None;
    for line in lines {
        line.walk(&mut |l| {
            if let Some(id) = l.line_id.as_deref() {
                if !seen.insert(id) && duplicate.is_none() {
                    duplicate = Some(id.to_string());
                }
            }
        });
    }
    match duplicate {
        Some(id) => Err(ApiStubError::IdentityCollision { id }),
        None => Ok(()),
    }
}
