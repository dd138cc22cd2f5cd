//! @dose
//! purpose: Parsers that turn raw declaration text into model types. `docstring` reads
//!     structured comments, `python` reads `def` source with tree-sitter, and `signature`
//!     combines source and reflection into a Signature.
//!
//! when-editing:
//!     - !None of these parsers return errors; problems are logged and the result degrades
//!
//! flows:
//!     - Function: SignatureExtractor::extract + parse_docstring -> reconcile

pub mod docstring;
pub mod python;
pub mod signature;

pub use docstring::{parse_docstring, DocstringParser};
pub use python::{ParsedDef, PythonSourceParser};
pub use signature::{ExtractedSignature, SignatureExtractor, SignatureOrigin};
