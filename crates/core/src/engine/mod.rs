//! Engine: plugin materialization plus lifecycle-intent execution
//!
//! Construction resolves the option-declared plugin requests into a flat
//! instance list and registers their hooks. Each lifecycle intent then runs
//! its fixed phase sequence exactly once over the shared context.

pub mod pipeline;

pub use pipeline::HookPipeline;

use crate::{
    context::Context,
    error::{Error, Result},
    options::ProjectOptions,
    plugin::{resolve_plugins, HookRegistry, PluginRegistry},
    transform::{IdentityTransformer, Transformer},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lifecycle intent selecting which phase sequence executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    New,
    Prepare,
    Build,
    Finalize,
}

impl Intent {
    /// Fixed phase sequence for this intent.
    pub fn phases(self) -> &'static [&'static str] {
        match self {
            Intent::New => &["scaffold:create", "scaffold:write"],
            Intent::Prepare => &["config:init", "generate:prepare", "generate:emit"],
            Intent::Build => &["build:prepare", "build:compile", "build:bundle"],
            Intent::Finalize => &["finalize:run"],
        }
    }
}

/// Linear lifecycle progression; intents may not run out of order or twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EngineState {
    Initialized,
    Prepared,
    Built,
    Finalized,
}

pub struct Engine {
    pipeline: HookPipeline,
    context: Context,
    state: EngineState,
    intent: Option<Intent>,
}

impl Engine {
    /// Construct an engine: validate options, resolve plugins, register
    /// their hooks. No phase runs yet.
    pub fn new(options: ProjectOptions, registry: &PluginRegistry) -> Result<Self> {
        Self::with_transformer(options, registry, Box::new(IdentityTransformer))
    }

    pub fn with_transformer(
        options: ProjectOptions,
        registry: &PluginRegistry,
        transformer: Box<dyn Transformer>,
    ) -> Result<Self> {
        options.validate()?;

        let plugins = resolve_plugins(&options.plugins, registry)?;
        debug!("resolved {} plugin instance(s)", plugins.len());

        let mut pipeline = HookPipeline::new();
        let mut plugin_names = Vec::with_capacity(plugins.len());
        for plugin in &plugins {
            let mut entries = Vec::new();
            let mut hooks = HookRegistry::new(plugin.name().to_string(), &mut entries);
            plugin.add_hooks(&mut hooks);
            pipeline.add_hooks(entries);
            plugin_names.push(plugin.name().to_string());
        }

        let mut context = Context::new(options, transformer);
        context.plugin_names = plugin_names;

        Ok(Self {
            pipeline,
            context,
            state: EngineState::Initialized,
            intent: None,
        })
    }

    /// Select the intent whose phase-group method will run next.
    pub fn set_intent(&mut self, intent: Intent) {
        self.intent = Some(intent);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Scaffold a new project. Runs from `Initialized` and leaves the
    /// engine ready to finalize.
    pub fn new_project(&mut self) -> Result<()> {
        self.transition(Intent::New, EngineState::Initialized, EngineState::Built)
    }

    pub fn prepare(&mut self) -> Result<()> {
        self.transition(Intent::Prepare, EngineState::Initialized, EngineState::Prepared)
    }

    pub fn build(&mut self) -> Result<()> {
        self.transition(Intent::Build, EngineState::Prepared, EngineState::Built)
    }

    /// Run the terminal phase and flush buffered artifacts to disk.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state != EngineState::Prepared && self.state != EngineState::Built {
            return Err(Error::EngineState(format!(
                "finalize is not valid from {:?}",
                self.state
            )));
        }
        self.expect_intent(Intent::Finalize)?;
        self.run_phases(Intent::Finalize)?;
        self.context.writer.flush(&self.context.paths.generated_dir)?;
        self.state = EngineState::Finalized;
        Ok(())
    }

    fn transition(&mut self, intent: Intent, from: EngineState, to: EngineState) -> Result<()> {
        if self.state != from {
            return Err(Error::EngineState(format!(
                "{intent:?} requires state {from:?}, engine is {:?}",
                self.state
            )));
        }
        self.expect_intent(intent)?;
        self.run_phases(intent)?;
        self.state = to;
        Ok(())
    }

    fn expect_intent(&self, intent: Intent) -> Result<()> {
        if self.intent != Some(intent) {
            return Err(Error::EngineState(format!(
                "intent {intent:?} was not selected (current: {:?})",
                self.intent
            )));
        }
        Ok(())
    }

    /// Run the intent's phases strictly in order; the first failure aborts
    /// the remaining phases. Applied side effects stay applied.
    fn run_phases(&mut self, intent: Intent) -> Result<()> {
        self.context.intent = Some(intent);
        for phase in intent.phases() {
            info!("running phase '{}'", phase);
            self.pipeline.run(phase, &mut self.context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(root: &std::path::Path) -> Engine {
        let options = ProjectOptions::new(root);
        Engine::new(options, &PluginRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_build_before_prepare_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = engine_for(temp.path());
        engine.set_intent(Intent::Build);
        assert!(matches!(engine.build(), Err(Error::EngineState(_))));
    }

    #[test]
    fn test_intent_must_match_phase_group_method() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = engine_for(temp.path());
        engine.set_intent(Intent::Build);
        assert!(matches!(engine.prepare(), Err(Error::EngineState(_))));
    }

    #[test]
    fn test_intents_cannot_rerun() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = engine_for(temp.path());
        engine.set_intent(Intent::Prepare);
        engine.prepare().unwrap();
        assert!(matches!(engine.prepare(), Err(Error::EngineState(_))));
    }

    #[test]
    fn test_full_lifecycle_progression() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = engine_for(temp.path());
        engine.set_intent(Intent::Prepare);
        engine.prepare().unwrap();
        engine.set_intent(Intent::Build);
        engine.build().unwrap();
        engine.set_intent(Intent::Finalize);
        engine.finalize().unwrap();
        assert!(matches!(engine.finalize(), Err(Error::EngineState(_))));
    }
}
