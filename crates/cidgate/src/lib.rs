//! cidgate - HTTP gateway in front of a content-addressed storage node.
//!
//! This library provides:
//! - `backend`: the storage backend trait, a Kubo RPC client and an in-memory backend
//! - `web`: axum router and handlers for upload, retrieve, list and health
//! - `persist`: on-disk copies of uploaded and retrieved content
//! - `serve`: server startup and graceful shutdown
//! - `telemetry`: tracing and OpenTelemetry setup
//! - `metrics`: OpenTelemetry instruments recorded by the handlers
//! - `commands`: one-shot CLI commands
//!
//! Classification, caching and naming live in the `cas` crate.

pub mod backend;
pub mod commands;
pub mod metrics;
pub mod persist;
pub mod serve;
pub mod telemetry;
pub mod web;

pub use backend::{BackendError, KuboBackend, MemoryBackend, PinnedObject, StorageBackend};
pub use metrics::GatewayMetrics;
pub use persist::CopyPersister;
pub use serve::BackendKind;
pub use web::{router, WebState};
