//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Widgets block on key input; the rendezvous viewer blocks on
//! the message queue with a receive timeout. Production code MUST NOT call
//! sleep to poll or to wait for events.

use architectural_enforcement::scan_production;

fn sleeps(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan_production(sleeps);

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nWait on the key source or the channel receive instead.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}
