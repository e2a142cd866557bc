//! Shared test helpers for `segscan-core` integration tests.
//!
//! Lightweight mocks for the scan ports so the orchestrator tests can focus
//! on scheduling behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod readers;
pub mod sinks;
