//! forgeline-core - build-orchestration engine
//!
//! This crate provides the core of the forgeline pipeline:
//! - A named-phase hook pipeline driven by lifecycle intents
//! - A plugin resolver that flattens and deduplicates plugin requests
//! - A transform service compiling single modules with content-hash
//!   memoization and diff-based position reconciliation
//! - An artifact writer buffering generated sources until finalization
pub mod context;
pub mod engine;
pub mod error;
pub mod options;
pub mod plugin;
pub mod transform;
pub mod writer;

// Re-export commonly used types and traits
pub use error::{Error, Result};

pub use context::{Context, DependencyKind, RuntimeEntry};
pub use engine::{Engine, HookPipeline, Intent};
pub use options::{Mode, ProjectOptions, ResolvedPaths};
pub use plugin::{
    Handler, HookRegistry, Plugin, PluginRegistry, PluginRequest, resolve_plugins,
};
pub use transform::{
    CompilationUnit, CompilerCache, CompilerHost, IdentityTransformer, TransformService,
    Transformer,
};
pub use writer::{artifact_name, ArtifactWriter, WriteOptions};
