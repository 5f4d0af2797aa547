// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Miette diagnostics for template errors.
#![allow(unused_assignments)]

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use vingo_engine::Error;

/// Parse error rendered against the template source.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(vingo::parse))]
pub struct TemplateDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,

    message: String,
}

impl TemplateDiagnostic {
    pub fn new(path: &Path, source: &str, err: &Error) -> Self {
        let span = err.span().map(|span| {
            let start = span.start.min(source.len());
            let end = span.end.clamp(start, source.len());
            SourceSpan::from((start, end - start))
        });
        Self {
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            span,
            message: err.to_string(),
        }
    }
}

/// Converts an engine error into a report, attaching source context to parse
/// errors when the file can still be read.
pub fn report(path: &Path, err: &Error) -> miette::Report {
    if matches!(err, Error::Parse { .. }) {
        if let Ok(source) = std::fs::read_to_string(path) {
            return TemplateDiagnostic::new(path, &source, err).into();
        }
    }
    miette::miette!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vingo_engine::Template;

    #[test]
    fn span_is_clamped_to_source() {
        let source = "ab <{ if x }>";
        let err = Template::parse_str("t", source).unwrap_err();
        let diagnostic = TemplateDiagnostic::new(Path::new("t.vgo"), "ab", &err);
        assert_eq!(diagnostic.span, Some(SourceSpan::from((2, 0))));

        let full = TemplateDiagnostic::new(Path::new("t.vgo"), source, &err);
        assert_eq!(full.span, Some(SourceSpan::from((3, 10))));
        assert!(full.message.contains("unclosed `if`"));
    }
}
