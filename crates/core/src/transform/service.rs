//! Transform service: single-module compilation with memoization
//!
//! One `compile` call builds an ephemeral compiler host, runs the configured
//! transformer over the entry module, and renders the matching output unit.
//! Results are memoized by content hash; compiler diagnostics are advisory
//! and flow to a warn callback instead of failing the call.

use super::{
    cache::CompilerCache,
    host::{CompilationUnit, CompilerHost},
    reconcile::{self, Reconciled},
};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Advisory diagnostic emitted during a transform
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub file: Option<PathBuf>,
}

/// Output of one transformer run: rewritten units plus diagnostics
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub units: Vec<CompilationUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A pluggable single-module transformer
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str {
        "transformer"
    }

    fn transform(&self, unit: &CompilationUnit, host: &mut CompilerHost) -> TransformOutput;
}

/// Transformer that passes every unit through unchanged
pub struct IdentityTransformer;

impl Transformer for IdentityTransformer {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn transform(&self, unit: &CompilationUnit, _host: &mut CompilerHost) -> TransformOutput {
        TransformOutput {
            units: vec![unit.clone()],
            diagnostics: Vec::new(),
        }
    }
}

/// Callback receiving diagnostics plus the file names the host touched
pub type WarnCallback = Box<dyn Fn(&[Diagnostic], &[String]) + Send + Sync>;

pub struct TransformService {
    root: PathBuf,
    transformer: Box<dyn Transformer>,
    cache: CompilerCache,
    warn: Option<WarnCallback>,
}

impl TransformService {
    pub fn new(root: impl Into<PathBuf>, transformer: Box<dyn Transformer>) -> Self {
        Self {
            root: root.into(),
            transformer,
            cache: CompilerCache::new(),
            warn: None,
        }
    }

    /// Replace the diagnostics sink; the default logs through `tracing`.
    pub fn with_warn_callback(mut self, warn: WarnCallback) -> Self {
        self.warn = Some(warn);
        self
    }

    /// Swap in a fresh cache, e.g. between independent pipeline runs.
    pub fn set_cache(&mut self, cache: CompilerCache) {
        self.cache = cache;
    }

    pub fn cache(&self) -> &CompilerCache {
        &self.cache
    }

    /// Compile one module: serve `source_text` for `file_path`, run the
    /// transformer, and render the matching output unit.
    ///
    /// Memoized by `(path, content hash)`; a hit skips the transformer
    /// entirely. The single fatal condition is a transformer producing no
    /// unit for `file_path`.
    pub fn compile(
        &mut self,
        file_path: &Path,
        source_text: &str,
        alias: &BTreeMap<String, String>,
    ) -> Result<String> {
        let key = CompilerCache::key_for(file_path, source_text);
        if let Some(hit) = self.cache.get(&key) {
            debug!("transform cache hit for {:?}", file_path);
            return Ok(hit.to_string());
        }

        let mut host = CompilerHost::new(&self.root, alias.clone());
        host.add_overlay(file_path, source_text);
        let unit = host.load_unit(file_path).ok_or_else(|| {
            Error::Compile(format!("failed to load module {}", file_path.display()))
        })?;

        let output = self.transformer.transform(&unit, &mut host);

        let matched = output
            .units
            .iter()
            .find(|u| u.path == file_path)
            .ok_or_else(|| {
                Error::Compile(format!(
                    "transformer '{}' produced no matching output for {}",
                    self.transformer.name(),
                    file_path.display()
                ))
            })?;
        let printed = print_unit(matched);

        self.cache.set(&key, &printed);
        self.report(&output.diagnostics, &host.touched_files());

        Ok(printed)
    }

    /// Derive a position mapping between an original module and its
    /// transformed text. `None` means "unchanged, reuse the prior mapping".
    pub fn reconcile(&self, name: &str, original: &str, transformed: &str) -> Option<Reconciled> {
        reconcile::reconcile(name, original, transformed)
    }

    fn report(&self, diagnostics: &[Diagnostic], touched: &[String]) {
        if diagnostics.is_empty() {
            return;
        }
        match &self.warn {
            Some(callback) => callback(diagnostics, touched),
            None => {
                for diagnostic in diagnostics {
                    warn!(
                        "transform diagnostic{}: {}",
                        diagnostic
                            .file
                            .as_ref()
                            .map(|f| format!(" [{}]", f.display()))
                            .unwrap_or_default(),
                        diagnostic.message
                    );
                }
            }
        }
    }
}

/// Render a transformed unit back to text with a single trailing newline.
fn print_unit(unit: &CompilationUnit) -> String {
    let trimmed = unit.text.trim_end_matches('\n');
    format!("{trimmed}\n")
}
