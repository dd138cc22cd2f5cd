//! Plain-text rendering of review lines.
//!
//! Used for `--format text` previews and for the string form of shortened types.
//! Children are indented four spaces per level; context-end lines print nothing.

use crate::types::{Line, Token};

const INDENT: &str = "    ";

/// Join tokens honouring their prefix/suffix spacing. Trailing whitespace is trimmed.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.prefix_space() && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push_str(&token.value);
        if token.suffix_space() {
            out.push(' ');
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Render a whole tree of lines as indented text.
pub fn render_lines(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        push_line(line, 0, &mut out);
    }
    out
}

fn push_line(line: &Line, depth: usize, out: &mut String) {
    if line.is_context_end_line != Some(true) {
        let text = render_tokens(&line.tokens);
        if !text.is_empty() {
            out.push_str(&INDENT.repeat(depth));
            out.push_str(&text);
        }
        out.push('\n');
    }
    for child in &line.children {
        push_line(child, depth + 1, out);
    }
}
