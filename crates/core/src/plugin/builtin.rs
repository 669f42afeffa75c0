//! Built-in plugins shipped with the default registry
//!
//! These are deliberately small: a file-system storage adapter generator
//! and a console log sink. Anything heavier belongs in an external plugin
//! crate.

use super::{HookRegistry, Plugin, PluginRegistry, PluginRequest};
use crate::{
    context::{DependencyKind, RuntimeEntry},
    writer::artifact_name,
};

/// Register every built-in factory.
pub fn register(registry: &mut PluginRegistry) {
    registry.register(
        "storage-fs",
        Box::new(|request: &PluginRequest| {
            let namespace = request.require_str("namespace")?.to_string();
            Ok(Box::new(StorageFsPlugin { namespace }) as Box<dyn Plugin>)
        }),
    );
    registry.register(
        "log-console",
        Box::new(|_request: &PluginRequest| {
            Ok(Box::new(LogConsolePlugin) as Box<dyn Plugin>)
        }),
    );
}

/// Generates one file-system storage adapter per namespace.
///
/// Identity is the namespace, so two instances configured with the same
/// namespace collapse into one.
pub struct StorageFsPlugin {
    namespace: String,
}

impl StorageFsPlugin {
    const NAME: &'static str = "storage-fs";

    fn entry_name(&self) -> String {
        artifact_name(Self::NAME, &self.namespace)
    }

    fn adapter_source(&self) -> String {
        format!(
            "// Generated by forgeline. Do not edit.\n\
             import {{ createFileStorage }} from \"@forgeline/storage-fs\";\n\
             \n\
             export const storage = createFileStorage({{ namespace: \"{}\" }});\n",
            self.namespace
        )
    }
}

impl Plugin for StorageFsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn identity(&self) -> Option<Vec<String>> {
        Some(vec![self.namespace.clone()])
    }

    fn add_hooks(&self, hooks: &mut HookRegistry<'_>) {
        let entry_name = self.entry_name();
        let plugin_name = Self::NAME.to_string();
        hooks.on(
            "generate:prepare",
            Box::new(move |ctx| {
                ctx.register_runtime(
                    "storage",
                    RuntimeEntry {
                        name: entry_name.clone(),
                        plugin: plugin_name.clone(),
                    },
                );
                ctx.add_dependency("@forgeline/storage-fs", DependencyKind::Dependency);
                Ok(())
            }),
        );

        let logical = self.entry_name();
        let content = self.adapter_source();
        hooks.on(
            "generate:emit",
            Box::new(move |ctx| {
                ctx.writer
                    .write(&logical, format!("storage/{logical}.ts"), &content);
                Ok(())
            }),
        );
    }
}

/// Registers a console log sink; takes no options and exists at most once.
pub struct LogConsolePlugin;

impl Plugin for LogConsolePlugin {
    fn name(&self) -> &str {
        "log-console"
    }

    fn identity(&self) -> Option<Vec<String>> {
        Some(Vec::new())
    }

    fn add_hooks(&self, hooks: &mut HookRegistry<'_>) {
        hooks.on(
            "generate:prepare",
            Box::new(|ctx| {
                ctx.register_runtime(
                    "logger",
                    RuntimeEntry {
                        name: "log-console".to_string(),
                        plugin: "log-console".to_string(),
                    },
                );
                ctx.add_dependency("@forgeline/log-console", DependencyKind::DevDependency);
                Ok(())
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_storage_fs_requires_namespace() {
        let registry = PluginRegistry::with_builtins();
        let result = registry.construct(&PluginRequest::new("storage-fs"));
        assert!(matches!(result, Err(Error::PluginResolution(_))));
    }

    #[test]
    fn test_storage_fs_identity_is_namespace() {
        let registry = PluginRegistry::with_builtins();
        let plugin = registry
            .construct(&PluginRequest::new("storage-fs").with_option("namespace", "logs"))
            .unwrap();
        assert_eq!(plugin.identity(), Some(vec!["logs".to_string()]));
    }
}
