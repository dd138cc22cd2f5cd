//! @dose
//! purpose: Review tree primitives handed to the external review tool. A Line is one
//!     addressable row with tokens and child lines; a Token is one styled fragment.
//!
//! when-editing:
//!     - !Every optional field must be skipped when None; presence is meaningful downstream
//!     - !Wire names are PascalCase and must not change
//!     - TokenKind serializes as its integer code, not its name
//!
//! invariants:
//!     - Lines are never mutated after the builder returns them
//!     - has_suffix_space None means "space follows"; has_prefix_space None means "no space"
//!
//! gotchas:
//!     - Blank lines are lines with no tokens, not newline tokens

use serde::{Serialize, Serializer};

/// Kind of a review token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Punctuation,
    Keyword,
    TypeName,
    Literal,
    StringLiteral,
    Whitespace,
    Newline,
    LineIdMarker,
}

impl TokenKind {
    pub fn code(self) -> u8 {
        match self {
            TokenKind::Text => 0,
            TokenKind::Punctuation => 1,
            TokenKind::Keyword => 2,
            TokenKind::TypeName => 3,
            TokenKind::Literal => 4,
            TokenKind::StringLiteral => 5,
            TokenKind::Whitespace => 6,
            TokenKind::Newline => 7,
            TokenKind::LineIdMarker => 8,
        }
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_to_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_diff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_suffix_space: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_prefix_space: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_documentation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_classes: Option<Vec<String>>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            navigation_display_name: None,
            navigate_to_id: None,
            skip_diff: None,
            is_deprecated: None,
            has_suffix_space: None,
            has_prefix_space: None,
            is_documentation: None,
            render_classes: None,
        }
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Keyword, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, value)
    }

    pub fn punctuation(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Punctuation, value)
    }

    pub fn type_name(value: impl Into<String>) -> Self {
        Self::new(TokenKind::TypeName, value).no_suffix_space()
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Literal, value).no_suffix_space()
    }

    pub fn string_literal(value: impl Into<String>) -> Self {
        Self::new(TokenKind::StringLiteral, value).no_suffix_space()
    }

    pub fn no_suffix_space(mut self) -> Self {
        self.has_suffix_space = Some(false);
        self
    }

    pub fn with_prefix_space(mut self) -> Self {
        self.has_prefix_space = Some(true);
        self
    }

    pub fn navigate_to(mut self, id: impl Into<String>) -> Self {
        self.navigate_to_id = Some(id.into());
        self
    }

    /// Make this token a node in the review tool's navigation panel.
    pub fn navigable(mut self, display_name: impl Into<String>, render_class: &str) -> Self {
        self.navigation_display_name = Some(display_name.into());
        self.render_classes = Some(vec![render_class.to_string()]);
        self
    }

    pub fn suffix_space(&self) -> bool {
        self.has_suffix_space.unwrap_or(true)
    }

    pub fn prefix_space(&self) -> bool {
        self.has_prefix_space.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_language_id: Option<String>,
    pub tokens: Vec<Token>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_context_end_line: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_to_line: Option<String>,
}

impl Line {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn with_id(tokens: Vec<Token>, id: impl Into<String>) -> Self {
        Self {
            line_id: Some(id.into()),
            tokens,
            ..Self::default()
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn context_end() -> Self {
        Self {
            is_context_end_line: Some(true),
            ..Self::default()
        }
    }

    pub fn related_to(mut self, id: impl Into<String>) -> Self {
        self.related_to_line = Some(id.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        if hidden {
            self.is_hidden = Some(true);
        }
        self
    }

    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty() && self.children.is_empty()
    }

    /// Depth-first walk over this line and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Line)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Complete review file for one package.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeFile {
    pub package_name: String,
    pub package_version: String,
    pub parser_version: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_language_package_id: Option<String>,
    pub review_lines: Vec<Line>,
}

impl CodeFile {
    pub fn new(package_name: String, package_version: String, review_lines: Vec<Line>) -> Self {
        Self {
            package_name,
            package_version,
            parser_version: env!("CARGO_PKG_VERSION").to_string(),
            language: "Python".to_string(),
            cross_language_package_id: None,
            review_lines,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
