//! Single-module source transformation: host, cache, service, reconciler

pub mod cache;
pub mod host;
pub mod reconcile;
pub mod service;

pub use cache::CompilerCache;
pub use host::{CompilationUnit, CompilerHost};
pub use reconcile::{reconcile, Edit, PositionMap, Reconciled};
pub use service::{
    Diagnostic, IdentityTransformer, TransformOutput, TransformService, Transformer, WarnCallback,
};
