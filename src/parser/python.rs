//! @dose
//! purpose: This module parses the source text of a single Python `def` with tree-sitter
//!     and reports its parameters (with roles, annotations and defaults), decorators,
//!     async flag and return annotation. It is the structural path of signature extraction.
//!
//! when-editing:
//!     - !Parameter roles come only from syntax: `/`, bare `*`, `*args` and `**kwargs`
//!     - !Source is dedented first; methods arrive with their class indentation
//!     - Annotation and default text is kept verbatim, never evaluated
//!
//! invariants:
//!     - Parameters are returned in declaration order
//!     - A `/` converts every parameter collected so far into positional-only
//!     - Anything after `*` or `*args` is keyword-only
//!
//! do-not:
//!     - Never guess a signature from a partial parse; return None and let the caller fall back
//!
//! gotchas:
//!     - tree-sitter recovers from errors, so a broken source may still contain a
//!       function_definition; that is accepted as long as one is found
//!     - Decorators live on the enclosing decorated_definition, not on the def itself
//!
//! flows:
//!     - Parse: dedent, create parser, parse, find first function_definition
//!     - Extract: walk the parameters node once, tracking the current role

use crate::types::{normalize_decorator, ParameterKind, ReflectedParameter};
use tree_sitter::{Node, Parser};

/// What the structural parse of one `def` yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDef {
    pub name: String,
    pub is_async: bool,
    pub decorators: Vec<String>,
    pub parameters: Vec<ReflectedParameter>,
    pub return_annotation: Option<String>,
}

/// Parser for Python function source
#[derive(Clone, Default)]
pub struct PythonSourceParser;

impl PythonSourceParser {
    pub fn new() -> Self {
        Self
    }

    fn create_parser(&self) -> Option<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .ok()?;
        Some(parser)
    }

    /// Parse the first function definition found in `source`.
    pub fn parse_def(&self, source: &str) -> Option<ParsedDef> {
        let source = dedent(source);
        let mut parser = self.create_parser()?;
        let tree = parser.parse(&source, None)?;
        let def = find_function(tree.root_node())?;

        let name = def
            .child_by_field_name("name")
            .map(|n| self.node_text(n, &source))?;
        let is_async = def.child(0).is_some_and(|c| c.kind() == "async");
        let decorators = self.extract_decorators(def, &source);
        let parameters = def
            .child_by_field_name("parameters")
            .map(|p| self.extract_parameters(p, &source))
            .unwrap_or_default();
        let return_annotation = def
            .child_by_field_name("return_type")
            .map(|n| self.node_text(n, &source));

        Some(ParsedDef {
            name,
            is_async,
            decorators,
            parameters,
            return_annotation,
        })
    }

    fn extract_decorators(&self, def: Node, source: &str) -> Vec<String> {
        let Some(parent) = def.parent() else {
            return Vec::new();
        };
        if parent.kind() != "decorated_definition" {
            return Vec::new();
        }

        let mut cursor = parent.walk();
        parent
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .map(|c| normalize_decorator(&self.node_text(c, source)).to_string())
            .collect()
    }

    fn extract_parameters(&self, params: Node, source: &str) -> Vec<ReflectedParameter> {
        let mut out: Vec<ReflectedParameter> = Vec::new();
        let mut kind = ParameterKind::PositionalOrKeyword;
        let mut cursor = params.walk();

        for child in params.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    out.push(self.param(self.node_text(child, source), kind, None, None));
                }
                "default_parameter" => {
                    let name = self.field_text(child, "name", source).unwrap_or_default();
                    let default = self.field_text(child, "value", source);
                    out.push(self.param(name, kind, None, default));
                }
                "typed_default_parameter" => {
                    let name = self.field_text(child, "name", source).unwrap_or_default();
                    let annotation = self.field_text(child, "type", source);
                    let default = self.field_text(child, "value", source);
                    out.push(self.param(name, kind, annotation, default));
                }
                "typed_parameter" => {
                    let annotation = self.field_text(child, "type", source);
                    let mut inner_cursor = child.walk();
                    let target = child.named_children(&mut inner_cursor).find(|c| {
                        matches!(
                            c.kind(),
                            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern"
                        )
                    });
                    let Some(target) = target else {
                        continue;
                    };
                    match target.kind() {
                        "list_splat_pattern" => {
                            let name = self.splat_name(target, source);
                            out.push(self.param(
                                name,
                                ParameterKind::VarPositional,
                                annotation,
                                None,
                            ));
                            kind = ParameterKind::KeywordOnly;
                        }
                        "dictionary_splat_pattern" => {
                            let name = self.splat_name(target, source);
                            out.push(self.param(name, ParameterKind::VarKeyword, annotation, None));
                        }
                        _ => {
                            let name = self.node_text(target, source);
                            out.push(self.param(name, kind, annotation, None));
                        }
                    }
                }
                "list_splat_pattern" => {
                    let name = self.splat_name(child, source);
                    out.push(self.param(name, ParameterKind::VarPositional, None, None));
                    kind = ParameterKind::KeywordOnly;
                }
                "dictionary_splat_pattern" => {
                    let name = self.splat_name(child, source);
                    out.push(self.param(name, ParameterKind::VarKeyword, None, None));
                }
                "keyword_separator" => kind = ParameterKind::KeywordOnly,
                "positional_separator" => {
                    for p in out.iter_mut() {
                        if p.kind == ParameterKind::PositionalOrKeyword {
                            p.kind = ParameterKind::PositionalOnly;
                        }
                    }
                }
                _ => {}
            }
        }

        out
    }

    fn param(
        &self,
        name: String,
        kind: ParameterKind,
        annotation: Option<String>,
        default: Option<String>,
    ) -> ReflectedParameter {
        ReflectedParameter {
            name,
            kind,
            annotation,
            default,
        }
    }

    fn splat_name(&self, splat: Node, source: &str) -> String {
        match splat.named_child(0) {
            Some(ident) => self.node_text(ident, source),
            None => self
                .node_text(splat, source)
                .trim_start_matches('*')
                .to_string(),
        }
    }

    fn field_text(&self, node: Node, field: &str, source: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.node_text(n, source))
    }

    fn node_text(&self, node: Node, source: &str) -> String {
        source[node.start_byte()..node.end_byte()].to_string()
    }
}

fn find_function(node: Node) -> Option<Node> {
    if node.kind() == "function_definition" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(find_function)
}

/// Remove the common leading indentation of all non-blank lines.
///
/// Only ASCII spaces and tabs count as indentation; other whitespace is content.
pub fn dedent(source: &str) -> String {
    let indent = source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(indent_width)
        .min()
        .unwrap_or(0);

    source
        .lines()
        .map(|l| {
            if indent_width(l) >= indent {
                &l[indent..]
            } else {
                l.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte length of the leading run of ASCII spaces and tabs.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}
