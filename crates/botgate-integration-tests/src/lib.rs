//! End-to-end tests for the botgate pipeline.
//!
//! This crate holds no library code; see `tests/` for the suites and
//! `tests/common/` for the shared harness.

#![deny(unsafe_code)]
#![deny(clippy::all)]
