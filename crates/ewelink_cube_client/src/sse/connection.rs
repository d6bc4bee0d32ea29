use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::frame::{EventFrame, FrameDecoder};
use super::handlers::{EventCallback, EventHandlers, HandlerRegistry};
use crate::client::Credentials;
use crate::error::StreamError;
use crate::{paths, CubeError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw body chunks of one open stream connection.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Opens the long-lived stream connection.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<ByteStream>;
}

/// Plain-HTTP connector. Has no overall request timeout, silence is bounded
/// by [`StreamOptions::read_timeout`] instead.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http_client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl StreamConnector for HttpConnector {
    async fn connect(&self, url: &str) -> Result<ByteStream> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CubeError::HttpStatus(status.as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(CubeError::from))
            .boxed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Longest wait for the connection to open, and longest silence
    /// tolerated before it is recycled.
    pub read_timeout: Duration,
    /// Pause before reopening a failed connection.
    pub reconnect_delay: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Streaming,
    Reconnecting,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    credentials: Credentials,
    connector: Arc<dyn StreamConnector>,
    registry: HandlerRegistry,
    options: StreamOptions,
    state: watch::Sender<StreamState>,
    running: Mutex<Option<Running>>,
}

/// Client for the bridge event stream.
///
/// [`start`](Self::start) spawns a background task owning the connection.
/// It decodes frames, dispatches them to the registered handlers one at a
/// time, and reopens the connection after any failure until
/// [`close`](Self::close) or [`unmount`](Self::unmount) is called. Handlers
/// survive reconnection.
#[derive(Clone)]
pub struct EventStreamClient {
    inner: Arc<Inner>,
    span: tracing::Span,
}

impl EventStreamClient {
    pub fn new(
        credentials: Credentials,
        connector: Arc<dyn StreamConnector>,
        options: StreamOptions,
    ) -> Self {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                credentials,
                connector,
                registry: HandlerRegistry::new(),
                options,
                state,
                running: Mutex::new(None),
            }),
            span: tracing::Span::current(),
        }
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    pub fn mount(&self, handlers: EventHandlers) {
        tracing::debug!("Mounting event handlers");
        self.inner.registry.mount(handlers);
    }

    pub fn register(&self, name: impl Into<String>, callback: EventCallback) {
        self.inner.registry.register(name, callback);
    }

    pub fn remove(&self, name: &str) -> bool {
        self.inner.registry.remove(name)
    }

    pub fn state(&self) -> StreamState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.inner.state.subscribe()
    }

    /// Spawns the stream task. Must be called from within a Tokio runtime.
    ///
    /// Fails without opening a connection when the host or the access token
    /// is missing. Calling it while the task is running does nothing.
    pub fn start(&self) -> Result<()> {
        if self.inner.credentials.host().trim().is_empty() {
            tracing::error!("Event stream needs a bridge host");
            return Err(CubeError::MissingHost);
        }
        if !self.inner.credentials.has_access_token() {
            tracing::error!("Event stream needs an access token");
            return Err(CubeError::MissingAccessToken);
        }

        let mut running = self.inner.lock_running();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            tracing::debug!("Event stream already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            run(self.inner.clone(), cancel.clone()).instrument(self.span.clone()),
        );
        *running = Some(Running { cancel, task });
        Ok(())
    }

    /// Stops the stream task and drops its connection. Handlers stay registered.
    pub async fn close(&self) {
        let running = self.inner.lock_running().take();
        if let Some(Running { cancel, task }) = running {
            cancel.cancel();
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!("Event stream task panicked: {}", e);
                }
            }
        }
        self.inner.set_state(StreamState::Disconnected);
    }

    /// Removes every handler, then closes the connection.
    pub async fn unmount(&self) {
        tracing::debug!("Unmounting event handlers");
        self.inner.registry.clear();
        self.close().await;
    }
}

impl Inner {
    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: StreamState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::trace!("Event stream state: {:?} -> {:?}", previous, state);
        }
    }

    /// Connects and reads until the connection fails, returning the failure.
    async fn connect_and_read(&self) -> StreamError {
        let Some(token) = self.credentials.access_token() else {
            return StreamError::Connect(CubeError::MissingAccessToken);
        };
        let host = self.credentials.host();
        let url = paths::stream_url(&host, &token);

        tracing::debug!("Opening event stream: host={}", host);
        let connect = self.connector.connect(&url);
        let mut stream = match tokio::time::timeout(self.options.read_timeout, connect).await {
            Err(_) => return StreamError::ConnectTimeout(self.options.read_timeout),
            Ok(Err(e)) => return StreamError::Connect(e),
            Ok(Ok(stream)) => stream,
        };

        self.set_state(StreamState::Streaming);
        if let Err(e) = self.registry.notify_open().await {
            self.registry.report_error(e).await;
        }

        let mut decoder = FrameDecoder::new();
        loop {
            let chunk = match tokio::time::timeout(self.options.read_timeout, stream.next()).await
            {
                Err(_) => return StreamError::ReadTimeout(self.options.read_timeout),
                Ok(None) => return StreamError::Closed,
                Ok(Some(Err(e))) => return StreamError::Transport(e),
                Ok(Some(Ok(chunk))) => chunk,
            };

            for frame in decoder.push(&chunk) {
                self.dispatch(frame).await;
            }
            if decoder.take_overflow() {
                let err = StreamError::LineTooLong(decoder.max_line_len());
                self.registry.report_error(err).await;
            }
        }
    }

    async fn dispatch(&self, frame: EventFrame) {
        let payload: Value = match serde_json::from_str(&frame.payload) {
            Ok(payload) => payload,
            Err(source) => {
                let err = StreamError::Decode {
                    event: frame.name,
                    source,
                };
                self.registry.report_error(err).await;
                return;
            }
        };

        tracing::debug!("Event received: {}", frame.name);
        match self.registry.dispatch(&frame.name, payload).await {
            Ok(true) => {}
            Ok(false) => tracing::trace!("No handler for event {}", frame.name),
            Err(e) => self.registry.report_error(e).await,
        }
    }
}

async fn run(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        inner.set_state(StreamState::Connecting);

        let failure = tokio::select! {
            _ = cancel.cancelled() => break,
            failure = inner.connect_and_read() => failure,
        };

        // An intentional close may have caused the failure.
        if cancel.is_cancelled() {
            break;
        }

        inner.set_state(StreamState::Reconnecting);
        inner.registry.report_error(failure).await;

        let delay = inner.options.reconnect_delay;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    inner.set_state(StreamState::Disconnected);
    tracing::debug!("Event stream stopped");
}
