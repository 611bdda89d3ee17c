//! Integration tests for ui-cartographer
//!
//! Crawls run against the in-memory driver for graph semantics and against
//! a wiremock server for the HTTP driver.

mod bfs_tests;
mod common;
mod http_driver_tests;
mod interactive_tests;
