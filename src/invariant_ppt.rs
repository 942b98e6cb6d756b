use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use lazy_static::lazy_static;
use log::error;

lazy_static! {
    /// Descriptions of every invariant asserted so far in this process.
    static ref CHECKED_INVARIANTS: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
}

/// Asserts that an installer invariant holds.
///
/// A violation panics in debug/test builds and is logged as critical in release builds.
/// Holding invariants are recorded so that `contract_test` can prove they were checked.
///
/// # Arguments
/// * `condition` - The boolean result of the check.
/// * `description` - What must hold (e.g., "Target directory exists before copying").
/// * `component` - Optional component tag (e.g., "Installer", "Layout").
pub fn assert_invariant(condition: bool, description: &str, component: Option<&str>) {
    if !condition {
        let msg = format!(
            "CRITICAL INVARIANT VIOLATION [{}]: {}",
            component.unwrap_or("General"),
            description
        );
        error!("{}", msg);

        if cfg!(debug_assertions) || cfg!(test) {
            panic!("{}", msg);
        }
    } else {
        checked_invariants().insert(description.to_string());
    }
}

/// The log stays usable after a panicking test poisoned it.
fn checked_invariants() -> MutexGuard<'static, HashSet<String>> {
    CHECKED_INVARIANTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Verifies that each of `required_invariants` was asserted at least once in this process.
///
/// The log is only ever added to, so tests running in parallel cannot hide each other's checks.
#[cfg(test)]
pub fn contract_test(context: &str, required_invariants: &[&str]) {
    let missing: Vec<&str> = {
        let checked = checked_invariants();
        required_invariants
            .iter()
            .copied()
            .filter(|req| !checked.contains(*req))
            .collect()
    };

    if !missing.is_empty() {
        panic!(
            "Contract Test Failed for '{}'. The following invariants were NOT checked:\n{:#?}",
            context, missing
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_invariant_is_recorded() {
        assert_invariant(true, "test: recorded invariant", Some("Test"));
        contract_test("recording", &["test: recorded invariant"]);
    }

    #[test]
    #[should_panic(expected = "CRITICAL INVARIANT VIOLATION [Test]")]
    fn violated_invariant_panics_in_tests() {
        assert_invariant(false, "test: violated invariant", Some("Test"));
    }

    #[test]
    #[should_panic(expected = "NOT checked")]
    fn contract_test_reports_unchecked_invariants() {
        contract_test("missing", &["test: never asserted"]);
    }

    #[test]
    fn failed_contract_does_not_break_later_checks() {
        let failed = std::panic::catch_unwind(|| {
            contract_test("missing", &["test: also never asserted"]);
        });
        assert!(failed.is_err());

        assert_invariant(true, "test: recorded after a failed contract", Some("Test"));
        contract_test("after failure", &["test: recorded after a failed contract"]);
    }

    #[test]
    fn poisoned_log_still_records() {
        let _ = std::panic::catch_unwind(|| {
            let _guard = CHECKED_INVARIANTS.lock();
            panic!("poison the log");
        });

        assert_invariant(true, "test: recorded into a poisoned log", Some("Test"));
        contract_test("poisoned", &["test: recorded into a poisoned log"]);
    }
}
