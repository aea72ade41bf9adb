//! Core types and trait definitions for the plugin sales reporter.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, sync, report, and API crates all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod month;
pub mod plugin;
pub mod query;
pub mod rate;
pub mod sale;
pub mod store;

pub use error::{Error, Result};
