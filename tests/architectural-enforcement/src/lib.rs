//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The widget core stays free of terminal frameworks
//! - Production code propagates errors instead of panicking
//! - Widgets wait on input or the rendezvous channel, never on a timer
//!
//! These tests are designed to catch violations early in the development cycle.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees checked by the scans
pub const PRODUCTION_DIRS: [&str; 3] = ["engine/core/src", "engine/signal/src", "tui/src"];

/// Files that exist only to support tests
pub const TEST_SUPPORT_FILES: [&str; 1] = ["testing.rs"];

/// One offending source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub file: PathBuf,
    pub line: usize,
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.text.trim())
    }
}

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every `.rs` file below `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Whether a file is test-only support code
pub fn is_test_support(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| TEST_SUPPORT_FILES.contains(&name))
}

/// Code lines of a file up to its `#[cfg(test)]` module, comments removed
///
/// Returned as (1-based line number, code) pairs.
pub fn production_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        let code = line.split("//").next().unwrap_or(line);
        lines.push((idx + 1, code.to_string()));
    }
    lines
}

/// Scan production lines of every production file with `matches`
pub fn scan_production<F>(matches: F) -> Vec<Violation>
where
    F: Fn(&str) -> bool,
{
    let mut violations = Vec::new();
    for dir in PRODUCTION_DIRS {
        for path in rust_files(dir) {
            if is_test_support(&path) {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for (line, code) in production_lines(&content) {
                if matches(&code) {
                    violations.push(Violation {
                        file: path.clone(),
                        line,
                        text: code,
                    });
                }
            }
        }
    }
    violations
}

/// Dependency names declared in the `[dependencies]` table of a manifest
pub fn dependency_names(manifest: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_dependencies = false;
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, _)) = line.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let content = "fn a() {}\n// x.unwrap()\nlet b = c; // d.unwrap()\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(content);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], (3, "let b = c; ".to_string()));
    }

    #[test]
    fn test_dependency_names_only_from_dependencies() {
        let manifest = "[package]\nname = \"x\"\n\n[dependencies]\n# Logging\ntracing = \"0.1\"\nserde = { version = \"1\" }\n\n[dev-dependencies]\nratatui = \"0.29\"\n";
        assert_eq!(dependency_names(manifest), vec!["tracing", "serde"]);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
