//! @dose
//! purpose: Builds a Signature for one function declaration. The structural path parses
//!     the `def` source; the annotation-only path reads the reflected parameter list.
//!
//! when-editing:
//!     - !Extraction never fails; a missing or unparseable source logs SourceUnavailable
//!       and falls back to the reflected parameters
//!     - Roles are assigned exactly as declared, nothing is inferred from names
//!
//! invariants:
//!     - A classmethod always has a leading `cls` slot
//!     - Decorators are returned without the leading `@`
//!
//! gotchas:
//!     - Reflection of a classmethod drops `cls`, the source keeps it; injection checks first
//!
//! flows:
//!     - extract: try source -> else reflected list -> build role maps -> inject cls

use crate::error::ApiStubError;
use crate::parser::python::PythonSourceParser;
use crate::types::{
    normalize_decorator, ArgRole, ArgumentDescriptor, FunctionDecl, ParameterKind,
    ReflectedParameter, Signature,
};
use tracing::{debug, warn};

/// Which path produced an extracted signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOrigin {
    Structural,
    AnnotationOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSignature {
    pub signature: Signature,
    pub decorators: Vec<String>,
    pub origin: SignatureOrigin,
}

#[derive(Clone, Default)]
pub struct SignatureExtractor {
    source_parser: PythonSourceParser,
}

impl SignatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the signature of `decl`. `owner` is only used in diagnostics.
    pub fn extract(&self, owner: &str, decl: &FunctionDecl) -> ExtractedSignature {
        let declared: Vec<String> = decl
            .decorators
            .iter()
            .map(|d| normalize_decorator(d).to_string())
            .collect();

        let parsed = match decl.source.as_deref() {
            Some(source) if !source.trim().is_empty() => {
                let parsed = self.source_parser.parse_def(source);
                if parsed.is_none() {
                    self.unavailable(owner, "no function definition found in source");
                }
                parsed
            }
            _ => {
                self.unavailable(owner, "declaration has no source text");
                None
            }
        };

        let (parameters, decorators, is_async, return_annotation, origin) = match parsed {
            Some(def) => {
                debug!(owner, params = def.parameters.len(), "structural signature");
                let decorators = if def.decorators.is_empty() {
                    declared
                } else {
                    def.decorators
                };
                (
                    def.parameters,
                    decorators,
                    decl.is_async || def.is_async,
                    def.return_annotation.or_else(|| decl.return_annotation.clone()),
                    SignatureOrigin::Structural,
                )
            }
            None => (
                decl.parameters.clone(),
                declared,
                decl.is_async,
                decl.return_annotation.clone(),
                SignatureOrigin::AnnotationOnly,
            ),
        };

        let mut signature = build_signature(&parameters);
        signature.name = decl.name.clone();
        signature.is_async = is_async;
        signature.is_class_method = decorators.iter().any(|d| d == "classmethod");
        signature.return_arg = return_annotation
            .filter(|r| !r.trim().is_empty())
            .map(|r| ArgumentDescriptor::new("return", ArgRole::Return).with_type(r));

        if signature.is_class_method {
            inject_receiver(&mut signature, &parameters);
        }

        ExtractedSignature {
            signature,
            decorators,
            origin,
        }
    }

    fn unavailable(&self, owner: &str, reason: &str) {
        warn!(
            "{}",
            ApiStubError::SourceUnavailable {
                id: owner.to_string(),
                reason: reason.to_string(),
            }
        );
    }
}

/// File each reflected parameter under the map for its role.
pub fn build_signature(parameters: &[ReflectedParameter]) -> Signature {
    let mut signature = Signature::default();
    for param in parameters {
        let mut arg = ArgumentDescriptor::new(&param.name, role_of(param.kind));
        arg.type_hint = param
            .annotation
            .clone()
            .filter(|a| !a.trim().is_empty());
        arg.default = param.default.clone().into();

        match param.kind {
            ParameterKind::PositionalOnly => signature.positional_only.insert(arg),
            ParameterKind::PositionalOrKeyword => signature.positional_or_keyword.insert(arg),
            ParameterKind::KeywordOnly => signature.keyword_only.insert(arg),
            ParameterKind::VarPositional => signature.var_positional = Some(arg),
            ParameterKind::VarKeyword => signature.var_keyword = Some(arg),
        }
    }
    signature
}

fn role_of(kind: ParameterKind) -> ArgRole {
    match kind {
        ParameterKind::PositionalOnly => ArgRole::PositionalOnly,
        ParameterKind::PositionalOrKeyword => ArgRole::PositionalOrKeyword,
        ParameterKind::KeywordOnly => ArgRole::KeywordOnly,
        ParameterKind::VarPositional => ArgRole::VarPositional,
        ParameterKind::VarKeyword => ArgRole::VarKeyword,
    }
}

fn inject_receiver(signature: &mut Signature, parameters: &[ReflectedParameter]) {
    if parameters.first().is_some_and(|p| p.name == "cls") {
        return;
    }
    if signature.positional_only.is_empty() {
        signature
            .positional_or_keyword
            .insert_front(ArgumentDescriptor::new("cls", ArgRole::PositionalOrKeyword));
    } else {
        signature
            .positional_only
            .insert_front(ArgumentDescriptor::new("cls", ArgRole::PositionalOnly));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;
    use pretty_assertions::assert_eq;

    fn function(name: &str) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            source_order: 0,
            is_async: false,
            decorators: Vec::new(),
            parameters: Vec::new(),
            return_annotation: None,
            source: None,
            docstring: None,
            hidden: false,
            cross_language_id: None,
        }
    }

    fn reflected(name: &str, kind: ParameterKind, annotation: Option<&str>, default: Option<&str>) -> ReflectedParameter {
        ReflectedParameter {
            name: name.to_string(),
            kind,
            annotation: annotation.map(str::to_string),
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn test_structural_matches_annotation_only() {
        let mut from_source = function("get");
        from_source.source = Some(
            "    def get(self, key: str, *, timeout: int = 30, **kwargs) -> bytes:\n        ...\n"
                .to_string(),
        );

        let mut from_reflection = function("get");
        from_reflection.parameters = vec![
            reflected("self", ParameterKind::PositionalOrKeyword, None, None),
            reflected("key", ParameterKind::PositionalOrKeyword, Some("str"), None),
            reflected("timeout", ParameterKind::KeywordOnly, Some("int"), Some("30")),
            reflected("kwargs", ParameterKind::VarKeyword, None, None),
        ];
        from_reflection.return_annotation = Some("bytes".to_string());

        let extractor = SignatureExtractor::new();
        let structural = extractor.extract("pkg.C.get", &from_source);
        let annotated = extractor.extract("pkg.C.get", &from_reflection);

        assert_eq!(structural.origin, SignatureOrigin::Structural);
        assert_eq!(annotated.origin, SignatureOrigin::AnnotationOnly);
        assert_eq!(structural.signature, annotated.signature);
    }

    #[test]
    fn test_unparseable_source_falls_back() {
        let mut decl = function("f");
        decl.source = Some("<built-in>".to_string());
        decl.parameters = vec![reflected("x", ParameterKind::PositionalOnly, None, None)];

        let (extracted, logs) = capture_logs(|| SignatureExtractor::new().extract("pkg.f", &decl));
        assert_eq!(extracted.origin, SignatureOrigin::AnnotationOnly);
        assert!(extracted.signature.positional_only.contains("x"));
        assert!(logs.contains("WARN"), "Got:\n{}", logs);
        assert!(
            logs.contains("source unavailable for pkg.f: no function definition found in source"),
            "Got:\n{}",
            logs
        );
    }

    #[test]
    fn test_missing_source_is_reported() {
        let (extracted, logs) = capture_logs(|| SignatureExtractor::new().extract("pkg.g", &function("g")));
        assert_eq!(extracted.origin, SignatureOrigin::AnnotationOnly);
        assert!(
            logs.contains("source unavailable for pkg.g: declaration has no source text"),
            "Got:\n{}",
            logs
        );
    }

    #[test]
    fn test_structural_extraction_is_quiet() {
        let mut decl = function("h");
        decl.source = Some("def h(a):\n    pass\n".to_string());
        let (extracted, logs) = capture_logs(|| SignatureExtractor::new().extract("pkg.h", &decl));
        assert_eq!(extracted.origin, SignatureOrigin::Structural);
        assert!(!logs.contains("source unavailable"), "Got:\n{}", logs);
    }

    #[test]
    fn test_classmethod_gets_receiver() {
        let mut decl = function("from_url");
        decl.decorators = vec!["@classmethod".to_string()];
        decl.parameters = vec![reflected("url", ParameterKind::PositionalOrKeyword, Some("str"), None)];

        let extracted = SignatureExtractor::new().extract("pkg.C.from_url", &decl);
        assert!(extracted.signature.is_class_method);
        assert_eq!(extracted.decorators, vec!["classmethod"]);
        assert_eq!(
            extracted.signature.positional_or_keyword.names().collect::<Vec<_>>(),
            vec!["cls", "url"]
        );
    }

    #[test]
    fn test_classmethod_source_keeps_single_receiver() {
        let mut decl = function("from_url");
        decl.source = Some("@classmethod\ndef from_url(cls, url): pass".to_string());

        let extracted = SignatureExtractor::new().extract("pkg.C.from_url", &decl);
        assert_eq!(
            extracted.signature.positional_or_keyword.names().collect::<Vec<_>>(),
            vec!["cls", "url"]
        );
    }

    #[test]
    fn test_async_from_source() {
        let mut decl = function("fetch");
        decl.source = Some("async def fetch(self): ...".to_string());
        assert!(SignatureExtractor::new().extract("pkg.fetch", &decl).signature.is_async);
    }
}
