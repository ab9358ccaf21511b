//! Common test utilities for workspace-monitor integration tests

#![allow(dead_code)]

pub mod test_repo;

pub use test_repo::{wait_for_changes, TestRepo};
