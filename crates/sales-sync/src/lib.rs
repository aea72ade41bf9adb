//! Ingestion of plugin sales from the remote sales system.
//!
//! [`SalesClient`] authenticates against the remote account site and pages
//! through its sales endpoint. [`ingest::refresh`] copies the sales the local
//! store is missing, and [`RefreshJob`] runs that as a cancellable background
//! task with observable progress.

pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod job;
pub mod remote;

pub use client::SalesClient;
pub use config::RemoteConfig;
pub use error::{Error, Result};
pub use ingest::RefreshOutcome;
pub use job::{RefreshHandle, RefreshJob, RefreshState};
