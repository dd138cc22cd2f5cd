pub mod text;
pub mod tree;
pub mod type_name;

pub use text::{render_lines, render_tokens};
pub use tree::{validate_line_ids, RenderOptions, SignatureWriter, TokenTreeBuilder};
pub use type_name::{shorten_text, TypeNameShortener};
