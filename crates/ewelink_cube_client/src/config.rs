use std::time::Duration;

const DEFAULT_HOST: &str = "ihost.local";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_STREAM_READ_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Connection settings for one bridge.
#[derive(Debug, Clone)]
pub struct CubeConfig {
    /// Host name or IP address of the bridge, without scheme.
    pub host: String,
    pub access_token: Option<String>,
    /// Per-request timeout for REST exchanges.
    pub timeout: Duration,
    /// Maximum silence on the event stream before the connection is recycled.
    pub stream_read_timeout: Duration,
    /// Pause between event-stream reconnection attempts. Zero reconnects immediately.
    pub reconnect_delay: Duration,
    /// Log raw response bodies at debug level.
    pub debug: bool,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            stream_read_timeout: DEFAULT_STREAM_READ_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            debug: false,
        }
    }
}

impl CubeConfig {
    pub fn new(host: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            host: host.into(),
            access_token,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stream_read_timeout(mut self, timeout: Duration) -> Self {
        self.stream_read_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn from_env() -> Self {
        let host = std::env::var("CUBE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let access_token = std::env::var("CUBE_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let debug = std::env::var("CUBE_DEBUG")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            host,
            access_token,
            timeout: duration_from_env("CUBE_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT),
            stream_read_timeout: duration_from_env("CUBE_STREAM_READ_TIMEOUT_MS")
                .unwrap_or(DEFAULT_STREAM_READ_TIMEOUT),
            reconnect_delay: duration_from_env("CUBE_RECONNECT_DELAY_MS")
                .unwrap_or(DEFAULT_RECONNECT_DELAY),
            debug,
        }
    }
}

fn duration_from_env(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
