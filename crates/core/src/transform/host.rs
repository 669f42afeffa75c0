//! Single-purpose compiler host for one transform call
//!
//! The host serves the entry module verbatim from an overlay instead of
//! reading it from disk, lazily caches every other source file it is asked
//! for, and falls back to alias-prefix rewriting when a module specifier
//! fails normal resolution.

use lru::LruCache;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upper bound on lazily cached source files per host
const SOURCE_CACHE_CAPACITY: usize = 256;

/// Extensions probed when a specifier names no file directly
const PROBE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "mjs"];

/// One parsed module: its resolved path, text, and the specifiers it imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub text: String,
    pub references: Vec<String>,
}

pub struct CompilerHost {
    root: PathBuf,
    alias: BTreeMap<String, String>,
    /// Sources served verbatim instead of from disk
    overlay: HashMap<PathBuf, String>,
    /// Lazily populated cache of on-disk sources
    files: LruCache<PathBuf, String>,
    /// Every file name this host served, for diagnostics reporting
    touched: BTreeSet<String>,
    import_pattern: Regex,
}

impl CompilerHost {
    pub fn new(root: impl Into<PathBuf>, alias: BTreeMap<String, String>) -> Self {
        Self {
            root: root.into(),
            alias,
            overlay: HashMap::new(),
            files: LruCache::new(NonZeroUsize::new(SOURCE_CACHE_CAPACITY).unwrap()),
            touched: BTreeSet::new(),
            // Covers `import x from "m"`, `import "m"` and `export ... from "m"`.
            import_pattern: Regex::new(
                r#"(?m)^\s*(?:import|export)\b[^'"\n]*?['"]([^'"]+)['"]"#,
            )
            .unwrap(),
        }
    }

    /// Serve `text` verbatim for `path`, bypassing disk entirely.
    pub fn add_overlay(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.overlay.insert(path.into(), text.into());
    }

    /// Read a module's source, preferring the overlay, then the lazy cache.
    pub fn read(&mut self, path: &Path) -> Option<String> {
        self.touched.insert(path.display().to_string());

        if let Some(text) = self.overlay.get(path) {
            return Some(text.clone());
        }
        if let Some(text) = self.files.get(path) {
            return Some(text.clone());
        }
        let text = std::fs::read_to_string(path).ok()?;
        self.files.put(path.to_path_buf(), text.clone());
        Some(text)
    }

    /// Parse one module into a compilation unit, scanning its imports.
    pub fn load_unit(&mut self, path: &Path) -> Option<CompilationUnit> {
        let text = self.read(path)?;
        let references = self
            .import_pattern
            .captures_iter(&text)
            .map(|c| c[1].to_string())
            .collect();
        Some(CompilationUnit {
            path: path.to_path_buf(),
            text,
            references,
        })
    }

    /// Resolve a module specifier relative to its importing file.
    ///
    /// Normal resolution first; when that fails and the alias table has a
    /// matching prefix, the longest such prefix is substituted and the
    /// rewritten specifier resolved again.
    pub fn resolve(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        if let Some(path) = self.resolve_plain(specifier, importer) {
            return Some(path);
        }

        let (prefix, replacement) = self
            .alias
            .iter()
            .filter(|(prefix, _)| specifier.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;
        let rewritten = format!("{replacement}{}", &specifier[prefix.len()..]);
        debug!("alias rewrite '{}' -> '{}'", specifier, rewritten);
        self.resolve_plain(&rewritten, importer)
    }

    fn resolve_plain(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        let base = if specifier.starts_with("./") || specifier.starts_with("../") {
            importer.parent()?.to_path_buf()
        } else {
            self.root.clone()
        };
        let joined = base.join(specifier.trim_start_matches("./"));

        if self.exists(&joined) {
            return Some(joined);
        }
        if let Some(ext) = PROBE_EXTENSIONS
            .iter()
            .copied()
            .find(|ext| self.exists(&joined.with_extension(ext)))
        {
            return Some(joined.with_extension(ext));
        }
        let index = joined.join("index.ts");
        if self.exists(&index) {
            return Some(index);
        }
        None
    }

    /// A path "exists" if the overlay holds it or it is a file on disk.
    fn exists(&self, path: &Path) -> bool {
        self.overlay.contains_key(path) || path.is_file()
    }

    /// Every file name this host was asked for, in sorted order.
    pub fn touched_files(&self) -> Vec<String> {
        self.touched.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn host_with_root(root: &Path) -> CompilerHost {
        CompilerHost::new(root, BTreeMap::new())
    }

    #[test]
    fn test_overlay_beats_disk() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("index.ts");
        std::fs::write(&entry, "on disk").unwrap();

        let mut host = host_with_root(temp.path());
        host.add_overlay(&entry, "from overlay");
        assert_eq!(host.read(&entry).as_deref(), Some("from overlay"));
    }

    #[test]
    fn test_lazy_file_cache_survives_disk_change() {
        let temp = TempDir::new().unwrap();
        let dep = temp.path().join("dep.ts");
        std::fs::write(&dep, "v1").unwrap();

        let mut host = host_with_root(temp.path());
        assert_eq!(host.read(&dep).as_deref(), Some("v1"));

        // Cached on first read within this host's lifetime.
        std::fs::write(&dep, "v2").unwrap();
        assert_eq!(host.read(&dep).as_deref(), Some("v1"));
    }

    #[test]
    fn test_load_unit_scans_imports() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("index.ts");
        let mut host = host_with_root(temp.path());
        host.add_overlay(
            &entry,
            "import { a } from \"./a\";\nimport \"side-effect\";\nexport { b } from './b';\nconst quoted = \"not an import\";\n",
        );

        let unit = host.load_unit(&entry).unwrap();
        assert_eq!(unit.references, vec!["./a", "side-effect", "./b"]);
    }

    #[test]
    fn test_resolve_relative_with_extension_probe() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("dep.ts"), "").unwrap();
        let importer = temp.path().join("index.ts");

        let mut host = host_with_root(temp.path());
        assert_eq!(
            host.resolve("./dep", &importer),
            Some(temp.path().join("dep.ts"))
        );
    }

    #[test]
    fn test_resolve_falls_back_to_longest_alias_prefix() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let deep = src.join("deep");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(src.join("util.ts"), "").unwrap();
        std::fs::write(deep.join("util.ts"), "").unwrap();

        let mut alias = BTreeMap::new();
        alias.insert("@app/".to_string(), "src/".to_string());
        alias.insert("@app/deep/".to_string(), "src/deep/".to_string());
        let mut host = CompilerHost::new(temp.path(), alias);

        let importer = temp.path().join("index.ts");
        assert_eq!(
            host.resolve("@app/deep/util", &importer),
            Some(deep.join("util.ts"))
        );
        assert_eq!(
            host.resolve("@app/util", &importer),
            Some(src.join("util.ts"))
        );
        assert_eq!(host.resolve("@missing/util", &importer), None);
    }

    #[test]
    fn test_touched_files_recorded() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("index.ts");
        let mut host = host_with_root(temp.path());
        host.add_overlay(&entry, "");
        host.read(&entry);

        assert_eq!(host.touched_files(), vec![entry.display().to_string()]);
    }
}
