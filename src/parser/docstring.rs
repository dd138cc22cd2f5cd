//! Structured docstring parsing.
//!
//! Reads Sphinx-style field lists (`:param x:`, `:type x:`, `:keyword str y:`,
//! `:rtype:`) into a [`StructuredComment`]. Everything that is not a recognised
//! tag line is free description text and is skipped.
//!
//! Type text may continue onto exactly one following line. That lookahead is a
//! heuristic and is kept as-is: it cannot tell a two-line type apart from a
//! one-line type followed by unrelated prose.
//!
//! `:param:` and `:keyword:` descriptions may state a default with a
//! `defaults to <expr>` phrase, possibly wrapped onto the following lines.

use crate::error::ApiStubError;
use crate::types::{ArgMap, ArgRole, ArgumentDescriptor, StructuredComment};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static TAG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*:([^:]+):(.*)").unwrap());
static DEFAULT_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdefaults\s+to\s+(.+?)(?:\.(?:\s|$)|$)").unwrap());
/// Sphinx cross-reference role such as :py:class:`pkg.Name`
static XREF_ROLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?::[\w-]+)+:`([^`]+)`$").unwrap());

/// Tag keywords understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Param,
    Keyword,
    IVar,
    Type,
    ParamType,
    VarType,
    ReturnType,
}

impl Tag {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "param" => Some(Tag::Param),
            "keyword" => Some(Tag::Keyword),
            "ivar" => Some(Tag::IVar),
            "type" => Some(Tag::Type),
            "paramtype" => Some(Tag::ParamType),
            "vartype" => Some(Tag::VarType),
            "rtype" => Some(Tag::ReturnType),
            _ => None,
        }
    }
}

/// Which map of the StructuredComment a tag reads or writes.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Positional,
    Keyword,
    InstanceVar,
}

/// One classified tag line.
#[derive(Debug)]
enum TagLine<'a> {
    /// `:param x:`, `:keyword x:`, `:ivar x:`
    Declare { slot: Slot, name: &'a str },
    /// `:param str x:` and friends
    DeclareTyped {
        slot: Slot,
        type_hint: &'a str,
        name: &'a str,
    },
    /// `:type x:`, `:paramtype x:`, `:vartype x:`
    SetType { slot: Slot, name: &'a str },
    /// `:rtype:`
    ReturnType,
}

fn classify<'a>(words: &[&'a str]) -> Option<TagLine<'a>> {
    let tag = Tag::from_word(words.first()?)?;
    match (tag, words.len()) {
        (Tag::Param, 2) => Some(TagLine::Declare {
            slot: Slot::Positional,
            name: words[1],
        }),
        (Tag::Keyword, 2) => Some(TagLine::Declare {
            slot: Slot::Keyword,
            name: words[1],
        }),
        (Tag::IVar, 2) => Some(TagLine::Declare {
            slot: Slot::InstanceVar,
            name: words[1],
        }),
        (Tag::Param, 3) => Some(TagLine::DeclareTyped {
            slot: Slot::Positional,
            type_hint: words[1],
            name: words[2],
        }),
        (Tag::Keyword, 3) => Some(TagLine::DeclareTyped {
            slot: Slot::Keyword,
            type_hint: words[1],
            name: words[2],
        }),
        (Tag::IVar, 3) => Some(TagLine::DeclareTyped {
            slot: Slot::InstanceVar,
            type_hint: words[1],
            name: words[2],
        }),
        (Tag::Type, 2) => Some(TagLine::SetType {
            slot: Slot::Positional,
            name: words[1],
        }),
        (Tag::ParamType, 2) => Some(TagLine::SetType {
            slot: Slot::Keyword,
            name: words[1],
        }),
        (Tag::VarType, 2) => Some(TagLine::SetType {
            slot: Slot::InstanceVar,
            name: words[1],
        }),
        (Tag::ReturnType, 1) => Some(TagLine::ReturnType),
        _ => None,
    }
}

/// Whether a raw line is a `:tag: remainder` line.
pub fn is_tag_line(line: &str) -> bool {
    TAG_LINE.is_match(line)
}

/// Pick the type text for a type tag from its inline remainder and the line after it.
///
/// Only one continuation line is ever consulted. Returns None when both are empty.
pub fn lookahead_type(remainder: &str, next: Option<&str>) -> Option<String> {
    let next = next.unwrap_or("");
    let picked = if !remainder.is_empty() && next.is_empty() {
        remainder.to_string()
    } else if remainder.is_empty() && !next.is_empty() {
        next.to_string()
    } else if is_tag_line(next) {
        remainder.to_string()
    } else {
        format!("{} {}", remainder, next).trim().to_string()
    };
    (!picked.is_empty()).then_some(picked)
}

/// Join a tag's inline description with its continuation lines, up to the next tag or blank line.
fn description(remainder: &str, following: &[&str]) -> String {
    let mut text = remainder.to_string();
    for line in following
        .iter()
        .take_while(|l| !l.is_empty() && !is_tag_line(l))
    {
        text.push(' ');
        text.push_str(line);
    }
    text
}

/// Default stated in a description as `defaults to <expr>`.
pub fn default_from_description(text: &str) -> Option<String> {
    let expr = DEFAULT_PHRASE.captures(text)?.get(1)?.as_str().trim();
    let expr = XREF_ROLE
        .captures(expr)
        .and_then(|c| c.get(1))
        .map_or(expr, |m| m.as_str());
    (!expr.is_empty()).then(|| expr.to_string())
}

/// Parser for a single docstring. `owner` is the identity id used in diagnostics.
pub struct DocstringParser<'a> {
    owner: &'a str,
    comment: StructuredComment,
}

impl<'a> DocstringParser<'a> {
    pub fn new(owner: &'a str) -> Self {
        Self {
            owner,
            comment: StructuredComment::default(),
        }
    }

    /// Parse `docstring` into a StructuredComment. Never fails; problems are logged.
    pub fn parse(mut self, docstring: &str) -> StructuredComment {
        if docstring.trim().is_empty() {
            self.diagnose("docstring is empty");
            return self.comment;
        }

        let lines: Vec<&str> = docstring.lines().map(str::trim).collect();
        for (idx, line) in lines.iter().enumerate() {
            let Some(caps) = TAG_LINE.captures(line) else {
                continue;
            };
            let tag = caps.get(1).map_or("", |m| m.as_str());
            let remainder = caps.get(2).map_or("", |m| m.as_str().trim());
            let words: Vec<&str> = tag.split_whitespace().collect();
            let next = lines.get(idx + 1).copied();

            match classify(&words) {
                Some(TagLine::Declare { slot, name }) => {
                    let arg = ArgumentDescriptor::new(name, role_for(slot));
                    let arg = with_stated_default(arg, slot, remainder, &lines[idx + 1..]);
                    self.map_mut(slot).insert(arg);
                }
                Some(TagLine::DeclareTyped {
                    slot,
                    type_hint,
                    name,
                }) => {
                    let arg = ArgumentDescriptor::new(name, role_for(slot)).with_type(type_hint);
                    let arg = with_stated_default(arg, slot, remainder, &lines[idx + 1..]);
                    self.map_mut(slot).insert(arg);
                }
                Some(TagLine::SetType { slot, name }) => {
                    let type_hint = lookahead_type(remainder, next);
                    let declared = match self.map_mut(slot).get_mut(name) {
                        Some(arg) => {
                            arg.type_hint = type_hint;
                            true
                        }
                        None => false,
                    };
                    if !declared {
                        self.diagnose(&format!(
                            "`:{}:` names `{}` which was never declared",
                            tag.trim(),
                            name
                        ));
                    }
                }
                Some(TagLine::ReturnType) => {
                    self.comment.return_type = lookahead_type(remainder, next);
                }
                None => debug!(owner = self.owner, tag, "skipping unrecognised docstring tag"),
            }
        }

        self.comment
    }

    fn map_mut(&mut self, slot: Slot) -> &mut ArgMap {
        match slot {
            Slot::Positional => &mut self.comment.positional,
            Slot::Keyword => &mut self.comment.keyword_only,
            Slot::InstanceVar => &mut self.comment.instance_vars,
        }
    }

    fn diagnose(&self, detail: &str) {
        let err = ApiStubError::MalformedComment {
            id: self.owner.to_string(),
            detail: detail.to_string(),
        };
        warn!("{}", err);
    }
}

fn with_stated_default(
    arg: ArgumentDescriptor,
    slot: Slot,
    remainder: &str,
    following: &[&str],
) -> ArgumentDescriptor {
    if matches!(slot, Slot::InstanceVar) {
        return arg;
    }
    match default_from_description(&description(remainder, following)) {
        Some(default) => arg.with_default(default),
        None => arg,
    }
}

fn role_for(slot: Slot) -> ArgRole {
    match slot {
        Slot::Positional | Slot::InstanceVar => ArgRole::PositionalOrKeyword,
        Slot::Keyword => ArgRole::KeywordOnly,
    }
}

/// Convenience wrapper around [`DocstringParser`].
pub fn parse_docstring(owner: &str, docstring: &str) -> StructuredComment {
    DocstringParser::new(owner).parse(docstring)
}
