// SPDX-License-Identifier: Apache-2.0 OR MIT
//! File-backed cache of compiled templates.
//!
//! Entries are keyed by canonical path and reused while the file's
//! modification time is unchanged. Compilation happens outside of any map
//! lock, so two callers racing on the same stale entry may both compile; the
//! last insert wins and both callers still get a consistent template.
//!
//! Entries are never evicted. Memory grows with the number of distinct paths
//! rendered over the life of the cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use dashmap::DashMap;

use crate::context::Context;
use crate::error::Error;
use crate::lexer::Syntax;
use crate::telemetry;
use crate::Template;

/// Concurrent map from canonical template path to compiled template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: DashMap<PathBuf, Arc<Template>>,
    syntax: Syntax,
}

impl TemplateCache {
    /// Empty cache using the default `<{ }>` delimiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose templates are tokenized with custom delimiters.
    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            entries: DashMap::new(),
            syntax,
        }
    }

    /// Process-wide cache used by [`crate::render_file`]. Starts empty.
    pub fn global() -> &'static TemplateCache {
        static GLOBAL: OnceLock<TemplateCache> = OnceLock::new();
        GLOBAL.get_or_init(TemplateCache::new)
    }

    /// Delimiters used for every template in this cache.
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Returns the compiled template for `path`, recompiling it when the file
    /// is new to the cache or its modification time changed.
    ///
    /// A failed compilation leaves any existing entry in place.
    pub fn get_or_compile(&self, path: impl AsRef<Path>) -> Result<Arc<Template>, Error> {
        let requested = path.as_ref();
        let path = fs::canonicalize(requested).map_err(|err| Error::io(requested, err))?;
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|err| Error::io(&path, err))?;

        if let Some(entry) = self.entries.get(&path) {
            if entry.modified() == Some(modified) {
                telemetry::record_cache_lookup(true);
                tracing::debug!(path = %path.display(), "template cache hit");
                return Ok(Arc::clone(entry.value()));
            }
        }

        telemetry::record_cache_lookup(false);
        tracing::debug!(path = %path.display(), "template cache miss, compiling");
        let start = Instant::now();
        let template = Template::load(&path, Some(modified), &self.syntax).map(Arc::new);
        if let Err(err) = &template {
            tracing::debug!(
                path = %path.display(),
                elapsed = ?start.elapsed(),
                error = %err,
                "template compilation failed"
            );
        }
        let template = template?;
        self.entries.insert(path, Arc::clone(&template));
        Ok(template)
    }

    /// Compiles (or reuses) the template at `path` and renders it.
    pub fn render(&self, path: impl AsRef<Path>, context: &Context) -> Result<String, Error> {
        Ok(self.get_or_compile(path)?.render(context))
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` has a cached entry, fresh or stale.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        fs::canonicalize(path).is_ok_and(|path| self.entries.contains_key(&path))
    }
}
