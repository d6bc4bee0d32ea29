//! eWeLink CUBE Client
//!
//! Async client for the Open API of eWeLink CUBE bridges (iHost, NSPanel Pro)
//! on the local network. Provides validated response envelopes, the link-button
//! access-token handshake, thin REST operations and a self-healing client for
//! the bridge's server-push event stream.

pub mod client;
pub mod config;
pub mod error;
pub mod ops;
pub mod paths;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::{Credentials, CubeClient, Method, Reply, Transport};
pub use config::CubeConfig;
pub use error::{CubeError, StreamError};
pub use sse::{EventHandlers, EventKind, EventStreamClient, StreamState};
pub use types::ResponseEnvelope;

/// Result type alias using CubeError
pub type Result<T> = std::result::Result<T, CubeError>;
