//! Named-phase hook pipeline
//!
//! Phases are string keys (`"<area>:<step>"`) owning append-only handler
//! lists. Handlers run strictly sequentially, in registration order: they
//! all mutate the one shared `Context`, and reproducible output requires a
//! deterministic schedule.

use crate::{context::Context, error::Result, plugin::Handler};
use std::collections::BTreeMap;
use tracing::debug;

struct NamedHandler {
    /// Owning plugin's name, recorded in the context execution log
    label: String,
    handler: Handler,
}

#[derive(Default)]
pub struct HookPipeline {
    phases: BTreeMap<String, Vec<NamedHandler>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one labeled handler to a phase. Handlers are never removed.
    pub fn add_handler(&mut self, phase: &str, label: &str, handler: Handler) {
        self.phases
            .entry(phase.to_string())
            .or_default()
            .push(NamedHandler {
                label: label.to_string(),
                handler,
            });
    }

    /// Append a batch of registrations, preserving their order.
    pub fn add_hooks(&mut self, entries: Vec<(String, String, Handler)>) {
        for (phase, label, handler) in entries {
            self.add_handler(&phase, &label, handler);
        }
    }

    pub fn handler_count(&self, phase: &str) -> usize {
        self.phases.get(phase).map(Vec::len).unwrap_or(0)
    }

    /// Run every handler registered for `phase`, sequentially.
    ///
    /// The first failing handler aborts the rest of the phase; the error is
    /// wrapped with the phase name and re-thrown. Side effects already
    /// applied are not rolled back.
    pub fn run(&self, phase: &str, context: &mut Context) -> Result<()> {
        let Some(handlers) = self.phases.get(phase) else {
            debug!("phase '{}' has no handlers", phase);
            return Ok(());
        };

        for named in handlers {
            context
                .execution_log
                .push(format!("{}@{phase}", named.label));
            (named.handler)(context).map_err(|e| e.in_phase(phase))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error, options::ProjectOptions, transform::IdentityTransformer,
    };

    fn test_context() -> Context {
        Context::new(
            ProjectOptions::new("/virtual"),
            Box::new(IdentityTransformer),
        )
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut pipeline = HookPipeline::new();
        pipeline.add_handler(
            "x:y",
            "first",
            Box::new(|ctx| {
                ctx.execution_log.push("first ran".to_string());
                Ok(())
            }),
        );
        pipeline.add_handler(
            "x:y",
            "second",
            Box::new(|ctx| {
                ctx.execution_log.push("second ran".to_string());
                Ok(())
            }),
        );

        let mut ctx = test_context();
        pipeline.run("x:y", &mut ctx).unwrap();
        assert_eq!(
            ctx.execution_log,
            vec!["first@x:y", "first ran", "second@x:y", "second ran"]
        );
    }

    #[test]
    fn test_failing_handler_aborts_remaining() {
        let mut pipeline = HookPipeline::new();
        pipeline.add_handler(
            "x:y",
            "boom",
            Box::new(|_ctx| Err(Error::Other("boom".to_string()))),
        );
        pipeline.add_handler(
            "x:y",
            "after",
            Box::new(|ctx| {
                ctx.execution_log.push("after ran".to_string());
                Ok(())
            }),
        );

        let mut ctx = test_context();
        let result = pipeline.run("x:y", &mut ctx);
        assert!(matches!(result, Err(Error::Phase { .. })));
        assert!(!ctx.execution_log.contains(&"after ran".to_string()));
    }

    #[test]
    fn test_unknown_phase_is_a_noop() {
        let pipeline = HookPipeline::new();
        let mut ctx = test_context();
        pipeline.run("no:such", &mut ctx).unwrap();
        assert!(ctx.execution_log.is_empty());
    }
}
