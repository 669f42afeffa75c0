//! Plugin contract and factory registry
//!
//! A plugin is any unit exposing a name and a hook-registration method.
//! Optional capabilities (declared dependencies, an identity for
//! deduplication) are default trait methods rather than separate traits, so
//! simple plugins stay one impl block.

pub mod builtin;
pub mod resolver;

use crate::{
    context::Context,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use resolver::resolve_plugins;

/// Option bag attached to one plugin request
pub type OptionBag = serde_json::Map<String, serde_json::Value>;

/// A request to materialize one plugin: its registered name plus options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RequestRepr", into = "RequestRepr")]
pub struct PluginRequest {
    pub name: String,
    pub options: OptionBag,
}

impl PluginRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: OptionBag::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Fetch a required string option, failing resolution when absent.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::PluginResolution(format!(
                    "plugin '{}' requires string option '{key}'",
                    self.name
                ))
            })
    }
}

/// Wire shape: `"name"` or `["name", { ...options }]`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RequestRepr {
    Name(String),
    WithOptions(String, OptionBag),
}

impl From<RequestRepr> for PluginRequest {
    fn from(repr: RequestRepr) -> Self {
        match repr {
            RequestRepr::Name(name) => PluginRequest::new(name),
            RequestRepr::WithOptions(name, options) => PluginRequest { name, options },
        }
    }
}

impl From<PluginRequest> for RequestRepr {
    fn from(request: PluginRequest) -> Self {
        if request.options.is_empty() {
            RequestRepr::Name(request.name)
        } else {
            RequestRepr::WithOptions(request.name, request.options)
        }
    }
}

/// Handler signature for one phase hook
pub type Handler = Box<dyn Fn(&mut Context) -> Result<()> + Send + Sync>;

/// Per-plugin view of the hook pipeline handed to `add_hooks`.
///
/// Registrations are labeled with the owning plugin's name so the engine
/// can record execution order.
pub struct HookRegistry<'a> {
    label: String,
    entries: &'a mut Vec<(String, String, Handler)>,
}

impl<'a> HookRegistry<'a> {
    pub(crate) fn new(label: String, entries: &'a mut Vec<(String, String, Handler)>) -> Self {
        Self { label, entries }
    }

    /// Append a handler to the named phase.
    pub fn on(&mut self, phase: &str, handler: Handler) {
        self.entries
            .push((phase.to_string(), self.label.clone(), handler));
    }
}

/// Main plugin interface
pub trait Plugin: Send + Sync {
    /// Registered plugin name
    fn name(&self) -> &str;

    /// Register phase handlers with the pipeline
    fn add_hooks(&self, hooks: &mut HookRegistry<'_>);

    /// Plugin requests that must be resolved before this plugin (optional)
    fn dependencies(&self) -> Vec<PluginRequest> {
        Vec::new()
    }

    /// Option values forming this instance's identity for deduplication
    /// (optional). `None` means instances are never deduplicated.
    fn identity(&self) -> Option<Vec<String>> {
        None
    }
}

/// Factory constructing a plugin instance from its request
pub type PluginFactory = Box<dyn Fn(&PluginRequest) -> Result<Box<dyn Plugin>> + Send + Sync>;

/// Name -> factory table used by the resolver
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &str, factory: PluginFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn construct(&self, request: &PluginRequest) -> Result<Box<dyn Plugin>> {
        let factory = self.factories.get(&request.name).ok_or_else(|| {
            Error::PluginResolution(format!("unknown plugin '{}'", request.name))
        })?;
        factory(request)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}
