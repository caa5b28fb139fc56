//! Shared test utilities: table-driven cases and filesystem fixtures.

pub mod fixtures;

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::time::Instant;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
    pub should_panic: bool,
}

/// Run every case, printing input, expected and actual values.
///
/// All cases run even after a failure so one report lists every mismatch.
///
/// # Errors
///
/// Returns one line per failing or unexpectedly panicking case.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> Result<(), String>
where
    I: Debug + Clone + RefUnwindSafe,
    E: Debug + PartialEq,
    F: Fn(I) -> E + UnwindSafe + RefUnwindSafe,
{
    let total = cases.len();
    let mut failures = Vec::new();

    for case in cases {
        let start = Instant::now();
        println!("[TEST] Running: {} input={:?}", case.name, case.input);

        let result = std::panic::catch_unwind(|| test_fn(case.input.clone()));
        let elapsed = start.elapsed();

        match (result, case.should_panic) {
            (Err(_), true) => println!("[TEST] PASSED (expected panic): {} ({elapsed:?})", case.name),
            (Ok(_), true) => failures.push(format!("{}: expected panic", case.name)),
            (Err(_), false) => failures.push(format!("{}: panicked unexpectedly", case.name)),
            (Ok(actual), false) if actual == case.expected => {
                println!("[TEST] PASSED: {} ({elapsed:?})", case.name);
            }
            (Ok(actual), false) => {
                println!("[TEST] FAILED: {} expected={:?} actual={actual:?}", case.name, case.expected);
                failures.push(format!(
                    "{}: expected {:?}, got {actual:?}",
                    case.name, case.expected
                ));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {total} case(s) failed:\n{}",
            failures.len(),
            failures.join("\n")
        ))
    }
}
