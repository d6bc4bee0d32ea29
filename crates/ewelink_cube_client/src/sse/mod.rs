//! Server-push event stream of the bridge.
//!
//! - `frame` - incremental `event:`/`data:` line decoder
//! - `event` - known event names
//! - `handlers` - callback types, [`EventHandlers`] and [`HandlerRegistry`]
//! - `connection` - [`EventStreamClient`] and its reconnection loop

pub mod connection;
pub mod event;
pub mod frame;
pub mod handlers;

pub use connection::{
    ByteStream, EventStreamClient, HttpConnector, StreamConnector, StreamOptions, StreamState,
};
pub use event::EventKind;
pub use frame::{EventFrame, FrameDecoder, MAX_LINE_LEN};
pub use handlers::{
    error_callback, event_callback, open_callback, ErrorCallback, EventCallback, EventHandlers,
    HandlerRegistry, OpenCallback,
};
