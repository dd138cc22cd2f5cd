//! @dose
//! purpose: Turns free-form Python type expressions into short display tokens. Dotted
//!     names lose their module prefix, generic wrappers are split on top-level commas and
//!     shortened argument by argument, and known declarations become navigable.
//!
//! when-editing:
//!     - !Only top-level separators split; a comma inside nested brackets never does
//!     - !Type tokens never carry a trailing space; the caller decides what follows
//!     - Builtin containers render as keywords, everything else as type names
//!
//! invariants:
//!     - Each recursive call strips at least one wrapper or separator, so recursion ends
//!     - shorten_text(x) equals the text of tokens(x) for the same expression
//!
//! gotchas:
//!     - `~` is Sphinx's "show only the last component" marker and is always dropped
//!     - Quoted forward references stay quoted as string literals
//!     - An expression that does not parse as a wrapper or a name is emitted verbatim

use crate::formatter::text::render_tokens;
use crate::index::NodeIndex;
use crate::types::Token;
use once_cell::sync::Lazy;
use regex::Regex;

static SIMPLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^~?[\w.]+$").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

const BUILTIN_CONTAINERS: &[&str] = &[
    "Union",
    "Optional",
    "Literal",
    "Callable",
    "Type",
    "List",
    "Dict",
    "Tuple",
    "Set",
    "FrozenSet",
    "Iterable",
    "Iterator",
    "AsyncIterable",
    "AsyncIterator",
    "Awaitable",
    "Sequence",
    "Mapping",
    "MutableMapping",
    "dict",
    "list",
    "tuple",
    "set",
    "frozenset",
    "type",
];

const LITERALS: &[&str] = &["None", "True", "False", "..."];

/// Shortens type expressions, resolving navigation targets through an optional index.
#[derive(Clone, Copy)]
pub struct TypeNameShortener<'a> {
    index: Option<&'a NodeIndex>,
    module: &'a str,
}

impl<'a> TypeNameShortener<'a> {
    /// Shortener that links names known to `index`, relative to `module`.
    pub fn new(index: &'a NodeIndex, module: &'a str) -> Self {
        Self {
            index: Some(index),
            module,
        }
    }

    /// Shortener without navigation.
    pub fn detached() -> Self {
        Self {
            index: None,
            module: "",
        }
    }

    pub fn tokens(&self, expr: &str) -> Vec<Token> {
        let mut out = Vec::new();
        self.push_expr(expr.trim(), &mut out);
        out
    }

    fn push_expr(&self, expr: &str, out: &mut Vec<Token>) {
        if expr.is_empty() {
            return;
        }

        let alternatives = split_alternatives(expr);
        if alternatives.len() > 1 {
            for (i, (part, sep)) in alternatives.iter().enumerate() {
                if i > 0 {
                    out.push(match sep {
                        Separator::Or => Token::text("or").with_prefix_space(),
                        Separator::Pipe => Token::punctuation("|").with_prefix_space(),
                    });
                }
                self.push_expr(part.trim(), out);
            }
            return;
        }

        if is_quoted(expr) {
            out.push(Token::string_literal(expr));
            return;
        }
        if LITERALS.contains(&expr) || NUMBER.is_match(expr) {
            out.push(Token::literal(expr));
            return;
        }

        if let Some(wrapper) = Wrapper::parse(expr) {
            if !wrapper.name.is_empty() {
                self.push_name(wrapper.name, out);
            }
            out.push(Token::punctuation(wrapper.open.to_string()).no_suffix_space());
            let args = split_top_level(wrapper.inner, ',');
            let args: Vec<&str> = args.into_iter().filter(|a| !a.trim().is_empty()).collect();
            for (i, arg) in args.iter().enumerate() {
                self.push_expr(arg.trim(), out);
                if i + 1 < args.len() {
                    out.push(Token::punctuation(","));
                }
            }
            out.push(Token::punctuation(wrapper.close.to_string()).no_suffix_space());
            return;
        }

        if SIMPLE_NAME.is_match(expr) {
            self.push_name(expr, out);
        } else {
            out.push(Token::type_name(expr));
        }
    }

    fn push_name(&self, name: &str, out: &mut Vec<Token>) {
        let full = name.trim_start_matches('~');
        let short = full.rsplit('.').next().unwrap_or(full);

        if BUILTIN_CONTAINERS.contains(&short) {
            out.push(Token::keyword(short).no_suffix_space());
            return;
        }

        let mut token = Token::type_name(short);
        if let Some(id) = self.index.and_then(|index| index.resolve(full, self.module)) {
            token = token.navigate_to(id);
        }
        out.push(token);
    }
}

/// Plain-text form of a shortened type expression.
pub fn shorten_text(expr: &str) -> String {
    render_tokens(&TypeNameShortener::detached().tokens(expr))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Or,
    Pipe,
}

struct Wrapper<'e> {
    name: &'e str,
    open: char,
    inner: &'e str,
    close: char,
}

impl<'e> Wrapper<'e> {
    /// `Name[...]` or `name(...)` where the bracket opened after the name closes at the end.
    fn parse(expr: &'e str) -> Option<Self> {
        let open_at = expr.find(['[', '('])?;
        let open = expr[open_at..].chars().next()?;
        let close = if open == '[' { ']' } else { ')' };
        let close_at = matching_close(expr, open_at)?;
        if close_at + close.len_utf8() != expr.len() {
            return None;
        }
        let name = expr[..open_at].trim();
        if !name.is_empty() && !SIMPLE_NAME.is_match(name) {
            return None;
        }
        Some(Self {
            name,
            open,
            inner: &expr[open_at + 1..close_at],
            close,
        })
    }
}

fn is_quoted(expr: &str) -> bool {
    expr.len() >= 2
        && ((expr.starts_with('"') && expr.ends_with('"'))
            || (expr.starts_with('\'') && expr.ends_with('\'')))
}

/// Byte index of the bracket closing the one at `open_at`.
fn matching_close(expr: &str, open_at: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in expr.char_indices().skip_while(|(i, _)| *i < open_at) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` where it is not nested in brackets or quotes.
fn split_top_level(expr: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            _ if c == sep && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// Split on top-level ` or ` and `|`. Each part carries the separator that preceded it.
fn split_alternatives(expr: &str) -> Vec<(&str, Separator)> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut pending = Separator::Or;
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            '|' if depth == 0 => {
                parts.push((&expr[start..i], pending));
                pending = Separator::Pipe;
                start = i + 1;
            }
            ' ' if depth == 0 && expr[i..].starts_with(" or ") => {
                parts.push((&expr[start..i], pending));
                pending = Separator::Or;
                i += " or ".len();
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push((&expr[start..], pending));
    parts
}
