//! Artifact writer: the in-memory-then-disk store for generated sources
//!
//! Plugins record generated files by logical name; identical rewrites are
//! no-ops for change tracking so downstream incremental builds can key off
//! modification. Nothing touches disk until `flush`, except the explicit
//! `write_to_disk` escape hatch.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One buffered generated file
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub disk_path: PathBuf,
    pub content: String,
    /// True when the most recent `write` changed the tracked content
    pub changed: bool,
}

/// Options for immediate disk writes
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Skip the reformatting step and persist content byte-for-byte
    pub skip_format: bool,
}

#[derive(Debug, Default)]
pub struct ArtifactWriter {
    files: BTreeMap<String, GeneratedFile>,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `content` under `logical_name`, scheduling it for `flush`.
    ///
    /// Rewriting identical content leaves the entry's change flag clear.
    pub fn write(&mut self, logical_name: &str, disk_path: impl Into<PathBuf>, content: &str) {
        if let Some(existing) = self.files.get_mut(logical_name) {
            // Identical content is a no-op for change tracking: the entry
            // keeps whatever change state this run already established.
            if existing.content == content {
                return;
            }
            existing.content = content.to_string();
            existing.disk_path = disk_path.into();
            existing.changed = true;
            return;
        }

        self.files.insert(
            logical_name.to_string(),
            GeneratedFile {
                disk_path: disk_path.into(),
                content: content.to_string(),
                changed: true,
            },
        );
    }

    pub fn get(&self, logical_name: &str) -> Option<&GeneratedFile> {
        self.files.get(logical_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Persist every buffered file under `generated_dir`.
    ///
    /// Writes are not transactional: a failure leaves earlier files on disk.
    pub fn flush(&self, generated_dir: &Path) -> Result<()> {
        for (name, file) in &self.files {
            let target = if file.disk_path.is_absolute() {
                file.disk_path.clone()
            } else {
                generated_dir.join(&file.disk_path)
            };
            debug!("flushing artifact '{}' to {:?}", name, target);
            Self::persist(&target, &file.content, WriteOptions::default())
                .map_err(|e| Error::ArtifactWrite(format!("{name}: {e}")))?;
        }
        Ok(())
    }

    /// Persist `content` to `disk_path` immediately, bypassing the buffer.
    pub fn write_to_disk(&self, disk_path: &Path, content: &str, opts: WriteOptions) -> Result<()> {
        Self::persist(disk_path, content, opts)
            .map_err(|e| Error::ArtifactWrite(format!("{}: {e}", disk_path.display())))
    }

    fn persist(path: &Path, content: &str, opts: WriteOptions) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let output = if opts.skip_format {
            content.to_string()
        } else {
            format_source(content)
        };
        std::fs::write(path, output)
    }
}

/// Minimal reformatting applied on persistence: a single trailing newline.
fn format_source(content: &str) -> String {
    let trimmed = content.trim_end_matches('\n');
    format!("{trimmed}\n")
}

/// Derive a stable, collision-free logical name for a plugin-scoped artifact.
///
/// Path-unsafe separators in the namespace are normalized so two instances
/// of the same plugin type never collide on disk.
pub fn artifact_name(plugin_name: &str, namespace: &str) -> String {
    let safe: String = namespace
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect();
    format!("{plugin_name}-{safe}")
}
