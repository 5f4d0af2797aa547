#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Compiler and renderer for vingo text templates.
//!
//! Templates embed `<{ ... }>` tags in arbitrary text: variable interpolation
//! with optional defaults, `if`/`elseif`/`else`, `for` loops and
//! `switch`/`case`. Sources are tokenized, compiled into a node tree once and
//! rendered against a [`Context`] as often as needed. [`TemplateCache`] keeps
//! compiled files around until their modification time changes.
//!
//! ```
//! use vingo_engine::{Context, Template};
//!
//! let template = Template::parse_str("greeting", "Hello <{ name | \"stranger\" }>!")?;
//! assert_eq!(template.render(&Context::new().with("name", "Ada")), "Hello Ada!");
//! assert_eq!(template.render(&Context::new()), "Hello stranger!");
//! # Ok::<(), vingo_engine::Error>(())
//! ```

pub mod ast;
mod cache;
mod context;
mod error;
pub mod expr;
pub mod lexer;
mod parser;
mod runtime;
mod ser;
pub mod telemetry;
mod value;

pub use ast::{Block, Node, Span};
pub use cache::TemplateCache;
pub use context::{Context, Scope};
pub use error::Error;
pub use expr::{evaluate, evaluate_against_value, Condition};
pub use lexer::{tokenize, tokenize_with, Syntax, Token, TokenKind};
pub use parser::compile;
pub use runtime::render_nodes;
pub use ser::to_value;
pub use value::{Record, Value};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use serde::Serialize;

/// Compiled template: the node tree plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
    nodes: Vec<Node>,
}

impl Template {
    /// Compiles in-memory source with the default `<{ }>` delimiters.
    pub fn parse_str(name: &str, source: &str) -> Result<Self, Error> {
        Self::parse_with_syntax(name, source, &Syntax::default())
    }

    /// Compiles in-memory source with custom delimiters.
    pub fn parse_with_syntax(name: &str, source: &str, syntax: &Syntax) -> Result<Self, Error> {
        let start = Instant::now();
        let result = compile(&tokenize_with(source, syntax));
        telemetry::record_compile(name, source.len(), start.elapsed(), result.is_ok());
        Ok(Self {
            name: name.to_string(),
            path: None,
            modified: None,
            nodes: result?,
        })
    }

    /// Reads and compiles a template file, bypassing any cache.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|err| Error::io(path, err))?;
        Self::load(path, Some(modified), &Syntax::default())
    }

    /// `modified` must be sampled before the file is read so that a write
    /// racing with the read is picked up by the next modification check.
    pub(crate) fn load(
        path: &Path,
        modified: Option<SystemTime>,
        syntax: &Syntax,
    ) -> Result<Self, Error> {
        let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let mut template = Self::parse_with_syntax(&path.display().to_string(), &source, syntax)?;
        template.path = Some(path.to_path_buf());
        template.modified = modified;
        Ok(template)
    }

    /// Name given at compile time, or the file path for loaded templates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the template was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Modification time of the file when it was compiled.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Compiled top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Renders against `context`. Rendering is best-effort and cannot fail.
    pub fn render(&self, context: &Context) -> String {
        let start = Instant::now();
        let mut out = String::new();
        render_nodes(&self.nodes, &Scope::new(context), &mut out);
        telemetry::record_render(&self.name, out.len(), start.elapsed());
        out
    }

    /// Renders against any serializable value whose top level is a map or a
    /// struct.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, Error> {
        Ok(self.render(&Context::from_serialize(data)?))
    }
}

/// Renders the template file at `path` through the process-wide
/// [`TemplateCache`].
pub fn render_file(path: impl AsRef<Path>, context: &Context) -> Result<String, Error> {
    TemplateCache::global().render(path, context)
}
