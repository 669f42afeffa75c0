//! Plugin resolution: deps-first flattening with identity deduplication

use super::{Plugin, PluginRegistry, PluginRequest};
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use tracing::debug;

/// Guard against plugin dependency chains that never bottom out
const MAX_DEPTH: usize = 64;

/// Expand `requests` into a flat, ordered, deduplicated instance list.
///
/// Every dependency's instance precedes the instance that declared it, so
/// infrastructure hooks register (and run) first. Identity deduplication is
/// first-registration-wins: a later instance whose `(name, identity)` tuple
/// matches an earlier one is dropped. Resolution is deterministic for a
/// given request list and registry.
pub fn resolve_plugins(
    requests: &[PluginRequest],
    registry: &PluginRegistry,
) -> Result<Vec<Box<dyn Plugin>>> {
    let mut resolved: Vec<Box<dyn Plugin>> = Vec::new();
    let mut seen: BTreeSet<(String, Vec<String>)> = BTreeSet::new();

    for request in requests {
        resolve_one(request, registry, &mut resolved, &mut seen, 0)?;
    }
    Ok(resolved)
}

fn resolve_one(
    request: &PluginRequest,
    registry: &PluginRegistry,
    resolved: &mut Vec<Box<dyn Plugin>>,
    seen: &mut BTreeSet<(String, Vec<String>)>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::PluginResolution(format!(
            "plugin dependency chain too deep at '{}'",
            request.name
        )));
    }

    let instance = registry.construct(request)?;

    if let Some(identity) = instance.identity() {
        let key = (instance.name().to_string(), identity);
        if seen.contains(&key) {
            debug!("dropping duplicate plugin instance '{}'", request.name);
            return Ok(());
        }
        seen.insert(key);
    }

    for dependency in instance.dependencies() {
        resolve_one(&dependency, registry, resolved, seen, depth + 1)?;
    }

    resolved.push(instance);
    Ok(())
}
