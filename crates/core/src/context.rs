//! Shared build context threaded through every phase
//!
//! One `Context` exists per engine; every phase handler mutates it in
//! place. It owns the dependency ledger, the runtime registry, the artifact
//! writer, and the transform service.

use crate::{
    engine::Intent,
    error::Result,
    options::{ProjectOptions, ResolvedPaths},
    transform::{Transformer, TransformService},
    writer::ArtifactWriter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How a ledger entry lands in the generated project manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Dependency,
    DevDependency,
}

/// One runtime capability contributed by a plugin (log sink, storage
/// backend, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEntry {
    pub name: String,
    /// Name of the contributing plugin
    pub plugin: String,
}

pub struct Context {
    pub options: ProjectOptions,
    pub paths: ResolvedPaths,
    /// Package-dependency ledger accumulated by plugins
    pub dependencies: BTreeMap<String, DependencyKind>,
    /// Runtime registry: category -> ordered contributions
    pub runtime: BTreeMap<String, Vec<RuntimeEntry>>,
    pub writer: ArtifactWriter,
    pub transform: TransformService,
    /// Names of the resolved plugins, in registration order
    pub plugin_names: Vec<String>,
    /// Lifecycle intent currently executing
    pub intent: Option<Intent>,
    /// Ordered record of handler executions, for tests and debugging
    pub execution_log: Vec<String>,
}

impl Context {
    pub fn new(options: ProjectOptions, transformer: Box<dyn Transformer>) -> Self {
        let paths = ResolvedPaths::from_options(&options);
        let transform = TransformService::new(&paths.root, transformer);
        Self {
            options,
            paths,
            dependencies: BTreeMap::new(),
            runtime: BTreeMap::new(),
            writer: ArtifactWriter::new(),
            transform,
            plugin_names: Vec::new(),
            intent: None,
            execution_log: Vec::new(),
        }
    }

    /// Record a package dependency; later registrations win on kind.
    pub fn add_dependency(&mut self, name: &str, kind: DependencyKind) {
        self.dependencies.insert(name.to_string(), kind);
    }

    /// Append a runtime contribution under `category`, preserving order.
    pub fn register_runtime(&mut self, category: &str, entry: RuntimeEntry) {
        self.runtime.entry(category.to_string()).or_default().push(entry);
    }

    pub fn runtime_entries(&self, category: &str) -> &[RuntimeEntry] {
        self.runtime.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compile one module through the transform service, using this
    /// context's alias table. Usable as a bundler on-load callback.
    pub fn compile(&mut self, file_path: &Path, source_text: &str) -> Result<String> {
        self.transform
            .compile(file_path, source_text, &self.options.alias)
    }
}
