//! Integration Test: Core Layering
//!
//! **Policy**: `modalterm-core` holds the widget state machines and talks to
//! the terminal only through its backend trait. It MUST NOT depend on a
//! terminal framework; ratatui and crossterm belong to the tui crate.

use std::fs;

use architectural_enforcement::{dependency_names, rust_files, workspace_root};

const FORBIDDEN_IN_CORE: [&str; 2] = ["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_terminal_framework() {
    let manifest = fs::read_to_string(workspace_root().join("engine/core/Cargo.toml"))
        .expect("core manifest readable");
    let names = dependency_names(&manifest);

    assert!(names.iter().any(|name| name == "thiserror"), "manifest parsed: {names:?}");
    for forbidden in FORBIDDEN_IN_CORE {
        assert!(
            !names.iter().any(|name| name == forbidden),
            "modalterm-core must not depend on {forbidden}"
        );
    }
}

#[test]
fn test_core_sources_never_name_a_terminal_framework() {
    let mut violations = Vec::new();
    for path in rust_files("engine/core/src") {
        let content = fs::read_to_string(&path).expect("source readable");
        for (idx, line) in content.lines().enumerate() {
            let code = line.split("//").next().unwrap_or(line);
            if FORBIDDEN_IN_CORE
                .iter()
                .any(|name| code.contains(&format!("{name}::")))
            {
                violations.push(format!("{}:{}: {}", path.display(), idx + 1, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "terminal framework used in modalterm-core:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_backend_lives_in_tui() {
    let manifest = fs::read_to_string(workspace_root().join("tui/Cargo.toml"))
        .expect("tui manifest readable");
    let names = dependency_names(&manifest);
    for framework in FORBIDDEN_IN_CORE {
        assert!(names.iter().any(|name| name == framework), "tui uses {framework}");
    }
}
