//! The assertion chain evaluated against a parsed response.

use std::fmt;

use crate::error::{BoxError, TestError};
use crate::response::Response;

type Check = Box<dyn Fn(&Response) -> Result<(), BoxError>>;

/// An ordered chain of checks over a [`Response`].
///
/// Checks run in the order they were appended and evaluation stops at the
/// first failure, which becomes the result of the whole run. An empty chain
/// always passes.
#[derive(Default)]
pub struct Expect {
    checks: Vec<Check>,
}

impl Expect {
    /// Appends an arbitrary predicate.
    pub fn custom<F>(&mut self, check: F) -> &mut Self
    where
        F: Fn(&Response) -> Result<(), BoxError> + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Expects an exact status code.
    pub fn status(&mut self, expected: u16) -> &mut Self {
        self.custom(move |resp| {
            let actual = resp.status().as_u16();
            if actual != expected {
                return Err(format!("expected status code {expected}, got {actual}").into());
            }
            Ok(())
        })
    }

    /// Expects a header to carry an exact value. Lookup is case-insensitive;
    /// a missing header compares as the empty string.
    pub fn header(&mut self, name: &str, expected: &str) -> &mut Self {
        let name = name.to_string();
        let expected = expected.to_string();
        self.custom(move |resp| {
            let actual = resp.header(&name).unwrap_or_default();
            if actual != expected {
                return Err(format!(
                    "expected response header named {name}: {expected:?}, got {actual:?}"
                )
                .into());
            }
            Ok(())
        })
    }

    /// Expects the full body, read as text, to match exactly.
    pub fn body(&mut self, expected: &str) -> &mut Self {
        let expected = expected.to_string();
        self.custom(move |resp| {
            let actual = resp.text();
            if actual != expected {
                return Err(format!("expected response body {expected:?}, got {actual:?}").into());
            }
            Ok(())
        })
    }

    /// Drops every check appended so far, in place. A reference held from
    /// before the reset observes the emptied chain.
    pub fn reset(&mut self) -> &mut Self {
        self.checks.clear();
        self
    }

    /// Number of checks currently in the chain.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub(crate) fn check(&self, resp: &Response) -> Result<(), TestError> {
        for check in &self.checks {
            check(resp).map_err(TestError::Assertion)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expect").field("checks", &self.checks.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn response() -> Response {
        Response::decode(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello",
        )
        .unwrap()
    }

    #[test]
    fn empty_chain_passes() {
        let expect = Expect::default();
        assert!(expect.check(&response()).is_ok());
    }

    #[test]
    fn matching_checks_pass() {
        let mut expect = Expect::default();
        expect
            .status(200)
            .header("content-type", "text/plain")
            .body("hello");
        assert!(expect.check(&response()).is_ok());
    }

    #[test]
    fn status_mismatch_names_both_codes() {
        let mut expect = Expect::default();
        expect.status(404);
        let err = expect.check(&response()).unwrap_err();
        assert_eq!(err.to_string(), "expected status code 404, got 200");
    }

    #[test]
    fn header_mismatch_names_header_and_values() {
        let mut expect = Expect::default();
        expect.header("Content-Type", "application/json");
        let err = expect.check(&response()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected response header named Content-Type: \"application/json\", got \"text/plain\""
        );
    }

    #[test]
    fn missing_header_compares_as_empty() {
        let mut expect = Expect::default();
        expect.header("X-Request-Id", "abc");
        let err = expect.check(&response()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected response header named X-Request-Id: \"abc\", got \"\""
        );
    }

    #[test]
    fn body_mismatch_names_both_bodies() {
        let mut expect = Expect::default();
        expect.body("goodbye");
        let err = expect.check(&response()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected response body \"goodbye\", got \"hello\""
        );
    }

    #[test]
    fn first_failure_short_circuits() {
        let later_runs = Rc::new(Cell::new(0));
        let counter = later_runs.clone();

        let mut expect = Expect::default();
        expect.status(500).custom(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        let err = expect.check(&response()).unwrap_err();
        assert_eq!(err.to_string(), "expected status code 500, got 200");
        assert_eq!(later_runs.get(), 0);
    }

    #[test]
    fn checks_run_in_insertion_order() {
        let mut expect = Expect::default();
        expect
            .custom(|_| Err("first".into()))
            .custom(|_| Err("second".into()));
        let err = expect.check(&response()).unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn reset_empties_the_chain() {
        let mut expect = Expect::default();
        expect.status(500).body("nope").custom(|_| Err("boom".into()));
        assert_eq!(expect.len(), 3);

        expect.reset();
        assert!(expect.is_empty());
        assert!(expect.check(&response()).is_ok());
    }

    #[test]
    fn chain_is_usable_after_reset() {
        let mut expect = Expect::default();
        expect.status(500);
        expect.reset().status(200);
        assert_eq!(expect.len(), 1);
        assert!(expect.check(&response()).is_ok());
    }
}
