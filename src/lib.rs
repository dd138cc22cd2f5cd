//! @dose
//! purpose: This is the library crate root for apistub, exposing the reconciliation and
//!     rendering engine for use as both a CLI tool and a library.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - Library code returns ApiStubError; only commands use anyhow
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main
//!
//! flows:
//!     - PackageSnapshot -> reconcile_package (pass one) -> TokenTreeBuilder (pass two)
//!       -> CodeFile

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod formatter;
pub mod index;
pub mod parser;
pub mod reconcile;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use error::{ApiStubError, Result};
pub use formatter::{shorten_text, RenderOptions, TokenTreeBuilder, TypeNameShortener};
pub use index::NodeIndex;
pub use parser::{parse_docstring, SignatureExtractor};
pub use reconcile::{reconcile, reconcile_package, ReconciledPackage};
pub use types::{CodeFile, Line, PackageSnapshot, Signature, StructuredComment, Token, TokenKind};
