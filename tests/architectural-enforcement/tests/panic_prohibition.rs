//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code MUST propagate errors with `?` instead of
//! calling `unwrap()` or `expect()`. A widget that panics leaves the terminal
//! in raw mode with windows still on screen.
//! **Exceptions**: test modules and the `testing` support module.

use architectural_enforcement::scan_production;

fn panics(code: &str) -> bool {
    code.contains(".unwrap()") || code.contains(".expect(")
}

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations = scan_production(panics);

    if !violations.is_empty() {
        eprintln!("\nPanicking calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nPropagate the error with `?`, or use unwrap_or/unwrap_or_else");
        eprintln!("with a meaningful fallback.");

        panic!(
            "\nFound {} unwrap/expect call(s) in production code.",
            violations.len()
        );
    }
}

#[test]
fn test_pattern_ignores_fallbacks() {
    assert!(panics("let x = y.unwrap();"));
    assert!(panics("let x = y.expect(\"ready\");"));
    assert!(!panics("let x = y.unwrap_or_default();"));
    assert!(!panics("let x = y.unwrap_or_else(|_| z);"));
}
