//! Assertion helpers.
//!
//! Checks inside an evaluation report "not yet" through
//! [`GuiCheckError::Assertion`] so the evaluator can retry them.

pub mod retry;

pub use retry::{Evaluator, RetryPolicy};

use crate::result::{GuiCheckError, GuiCheckResult};
use std::fmt::Debug;

/// Fail with `message()` unless `condition` holds
///
/// # Errors
/// Assertion failure if `condition` is false
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> GuiCheckResult<()> {
    if condition {
        Ok(())
    } else {
        Err(GuiCheckError::assertion(message()))
    }
}

/// Fail unless `actual == expected`
///
/// # Errors
/// Assertion failure naming `what` and both values
pub fn ensure_eq<T: PartialEq + Debug>(what: &str, expected: &T, actual: &T) -> GuiCheckResult<()> {
    ensure(expected == actual, || {
        format!("Unexpected {what}: Expected: {expected:?}, Actual: {actual:?}")
    })
}

/// Unwrap `value` or fail with `message()`
///
/// # Errors
/// Assertion failure if `value` is `None`
pub fn ensure_some<T>(value: Option<T>, message: impl FnOnce() -> String) -> GuiCheckResult<T> {
    value.ok_or_else(|| GuiCheckError::assertion(message()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure() {
        assert!(ensure(true, || unreachable!()).is_ok());
        let err = ensure(false, || "blocked".into()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "blocked");
    }

    #[test]
    fn test_ensure_eq_message() {
        assert!(ensure_eq("tree visibility", &true, &true).is_ok());
        let err = ensure_eq("tree visibility", &true, &false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected tree visibility: Expected: true, Actual: false"
        );
    }

    #[test]
    fn test_ensure_some() {
        assert_eq!(ensure_some(Some(3), || unreachable!()).unwrap(), 3);
        let err = ensure_some(None::<u8>, || "Cannot find context menu".into()).unwrap_err();
        assert!(err.is_retryable());
    }
}
