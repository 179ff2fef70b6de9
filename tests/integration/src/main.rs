//! Integration Test Harness
//!
//! Runs each scenario family against the simulated server and reports which
//! behavioural properties held.
//!
//! # Usage
//!
//! Run all families:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run one family:
//! ```text
//! cargo test -p integration-tests --test identity_tests
//! cargo test -p integration-tests --test enumeration_tests
//! cargo test -p integration-tests --test capability_tests
//! cargo test -p integration-tests --test session_tests
//! ```
//!
//! Run with increased logging:
//! ```text
//! RUST_LOG=debug cargo run -p integration-tests
//! ```

mod common;

use std::process::Command;
use std::time::Instant;

use common::{CategoryResult, TestSuiteResults};

/// A scenario family and the properties its tests establish
struct Family {
    name: &'static str,
    target: &'static str,
    properties: &'static [&'static str],
}

const FAMILIES: &[Family] = &[
    Family {
        name: "Identity",
        target: "identity_tests",
        properties: &[
            "references to one object resolve to one identity",
            "every acquired reference is released once",
            "disconnected objects fail without leaking",
        ],
    },
    Family {
        name: "Enumeration",
        target: "enumeration_tests",
        properties: &[
            "views yield elements in server order",
            "mutation mid-iteration invalidates the view",
            "queries are deferred and stop at the first error",
        ],
    },
    Family {
        name: "Capability",
        target: "capability_tests",
        properties: &[
            "hide and show each use a fresh identity",
            "one reference is held during the native call",
            "the reference is released when the call fails",
        ],
    },
    Family {
        name: "Session",
        target: "session_tests",
        properties: &[
            "scenarios load, run and exit end to end",
            "window control brackets a bounded run",
            "references disconnect after exit",
        ],
    },
];

/// Passed and failed counts from libtest's `test result:` line
fn parse_counts(stdout: &str) -> Option<(usize, usize)> {
    let line = stdout.lines().find(|l| l.starts_with("test result:"))?;
    let count = |label: &str| -> Option<usize> {
        line.split(';')
            .find(|part| part.trim_end().ends_with(label))?
            .split_whitespace()
            .rev()
            .nth(1)?
            .parse()
            .ok()
    };
    Some((count("passed")?, count("failed")?))
}

fn run_family(family: &Family) -> CategoryResult {
    println!("\n== {} ({})", family.name, family.target);

    let start = Instant::now();
    let output = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", family.target])
        .output();
    let duration = start.elapsed();

    let (passed, summary) = match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let counts = match parse_counts(&stdout) {
                Some((ok, failed)) => format!("{} passed, {} failed", ok, failed),
                None => "no test summary".to_string(),
            };
            if !output.status.success() {
                eprintln!("{}", stdout);
                eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            }
            (output.status.success(), counts)
        }
        Err(e) => (false, format!("cargo did not start: {}", e)),
    };

    let mark = if passed { "ok" } else { "FAILED" };
    for property in family.properties {
        println!("   [{}] {}", mark, property);
    }

    CategoryResult {
        name: family.name,
        passed,
        duration,
        summary,
    }
}

fn main() {
    println!("Vissim automation integration suite");

    let mut results = TestSuiteResults::default();
    for family in FAMILIES {
        results.record(run_family(family));
    }

    println!();
    for result in &results.categories {
        println!(
            "{:<12} {:<7} {:>10.2?}  {}",
            result.name,
            if result.passed { "PASS" } else { "FAIL" },
            result.duration,
            result.summary
        );
    }
    println!(
        "{} of {} families passed in {:.2?}",
        results.passed(),
        results.categories.len(),
        results.total_duration()
    );

    if results.failed() > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counts() {
        let stdout = "running 6 tests\n\
                      test result: ok. 6 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.01s\n";
        assert_eq!(parse_counts(stdout), Some((6, 0)));
    }

    #[test]
    fn test_parse_counts_with_failures() {
        let stdout = "test result: FAILED. 5 passed; 1 failed; 0 ignored; 0 measured; 0 filtered out\n";
        assert_eq!(parse_counts(stdout), Some((5, 1)));
    }

    #[test]
    fn test_parse_counts_without_summary() {
        assert_eq!(parse_counts("error: could not compile"), None);
    }

    #[test]
    fn test_every_family_has_a_target() {
        for family in FAMILIES {
            assert!(family.target.ends_with("_tests"));
            assert!(!family.properties.is_empty());
        }
    }
}
