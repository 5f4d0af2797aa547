// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::path::PathBuf;

use crate::ast::Span;
use thiserror::Error;

/// Unified error type for the template engine.
///
/// Parse errors carry the `Span` of the offending tag when one is known so
/// callers can point at the template source. Rendering itself never fails;
/// `Evaluation` errors only surface through the condition evaluator's own
/// entry points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Structural problem found while tokenizing or compiling a template.
    #[error("parse error: {message}")]
    Parse {
        /// What is wrong, quoting the offending tag where possible.
        message: String,
        /// Byte range of the offending tag.
        span: Option<Span>,
    },
    /// Comparison between values with no defined ordering.
    #[error("evaluation error: {message}")]
    Evaluation {
        /// Operator and operand types involved.
        message: String,
    },
    /// Template file could not be resolved, inspected or read.
    #[error("cannot read template {}: {source}", path.display())]
    Io {
        /// Path as given by the caller, or canonicalized once resolved.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Application data that cannot be turned into a render context.
    #[error("invalid template data: {message}")]
    Data {
        /// Why the data was rejected.
        message: String,
    },
}

impl Error {
    /// Parse error with an optional location.
    pub fn parse(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Parse {
            message: message.into(),
            span,
        }
    }

    /// Parse error located at `span`.
    pub fn parse_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::parse(message, Some(span))
    }

    /// Evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
        }
    }

    /// Rejected application data.
    pub fn data(message: impl Into<String>) -> Self {
        Error::Data {
            message: message.into(),
        }
    }

    /// Filesystem failure on `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Location of a parse error in the template source, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Parse { span, .. } => *span,
            _ => None,
        }
    }

    /// Attaches `span` to a parse error that does not carry one yet.
    pub(crate) fn or_span(self, span: Span) -> Self {
        match self {
            Error::Parse {
                message,
                span: None,
            } => Error::Parse {
                message,
                span: Some(span),
            },
            other => other,
        }
    }
}
