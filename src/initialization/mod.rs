//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - TLS policy and per-directive HTTP clients
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::{init_session_client, init_sitemap_client, SessionClient, TlsPolicy};
pub use logger::init_logger_with;
