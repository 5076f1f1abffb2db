//! End-to-end tests for the marketplace service.
//!
//! These tests wire a real in-memory service against a scriptable fake
//! chain and exercise the full flows: sign-in, publishing, entitlement
//! classification, purchase settlement, and the like toggle.

mod harness;
mod marketplace_tests;

pub use harness::{FakeChain, TestHarness};
