//! Phase-tracking test logger.
//!
//! Prints one line per phase to stderr with the elapsed time, so a failing
//! integration test shows how far it got. Silent unless `TEST_LOG` is set.
#![allow(dead_code)]

use std::cell::RefCell;
use std::time::Instant;

/// Per-test logger.
pub struct TestLogger {
    name: String,
    start: Instant,
    phase: RefCell<&'static str>,
    enabled: bool,
}

impl TestLogger {
    #[must_use]
    pub fn new(name: &str) -> Self {
        let logger = Self {
            name: name.to_string(),
            start: Instant::now(),
            phase: RefCell::new("init"),
            enabled: std::env::var_os("TEST_LOG").is_some(),
        };
        logger.emit("START", "");
        logger
    }

    /// Enter a new phase: setup, execute, verify.
    pub fn phase(&self, phase: &'static str) {
        *self.phase.borrow_mut() = phase;
        self.emit("PHASE", phase);
    }

    pub fn info(&self, message: &str) {
        self.emit("INFO", message);
    }

    /// Log an outgoing request.
    pub fn http_request(&self, method: &str, url: &str) {
        self.emit("HTTP", &format!("{method} {url}"));
    }

    pub fn finish_ok(&self) {
        self.emit("PASS", "");
    }

    fn emit(&self, kind: &str, message: &str) {
        if self.enabled {
            eprintln!(
                "[{:>6}ms] {} {kind:<5} [{}] {message}",
                self.start.elapsed().as_millis(),
                self.name,
                self.phase.borrow(),
            );
        }
    }
}
