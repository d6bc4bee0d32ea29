//! Incremental decoder for the bridge's line-oriented push framing.
//!
//! An event is one `event:` line naming it, followed by one `data:` line with
//! a non-empty payload. Blank `data:` lines are skipped and keep the pending
//! name; every other line is ignored.

/// One decoded `event:`/`data:` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub name: String,
    pub payload: String,
}

/// Longest line kept while waiting for its terminator.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no line terminator.
    scanned: usize,
    max_line_len: usize,
    /// Skipping the tail of an oversized line.
    discarding: bool,
    overflowed: bool,
    pending_event: Option<String>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_len,
            discarding: false,
            overflowed: false,
            pending_event: None,
        }
    }

    /// Appends a chunk read from the connection and returns every frame it completes.
    ///
    /// A line longer than the limit is dropped whole, together with any
    /// pending event name; [`take_overflow`](Self::take_overflow) reports it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<EventFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            if self.discarding {
                self.discarding = false;
            } else {
                let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
                if let Some(frame) = self.feed_line(&line) {
                    frames.push(frame);
                }
            }
            start = end + 1;
            search_from = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_len {
            self.buffer.clear();
            self.scanned = 0;
            if !self.discarding {
                tracing::warn!("Dropping stream line longer than {} bytes", self.max_line_len);
                self.discarding = true;
                self.overflowed = true;
                self.pending_event = None;
            }
        }
        frames
    }

    /// Whether a line was dropped for length since the last call.
    pub fn take_overflow(&mut self) -> bool {
        std::mem::take(&mut self.overflowed)
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    /// Processes one complete line, without its terminator.
    pub fn feed_line(&mut self, line: &str) -> Option<EventFrame> {
        let line = line.trim();

        if let Some(name) = line.strip_prefix("event:") {
            let name = name.trim();
            self.pending_event = (!name.is_empty()).then(|| name.to_string());
            return None;
        }

        let data = line.strip_prefix("data:")?;
        if data.trim().is_empty() {
            return None;
        }
        let name = self.pending_event.take()?;
        Some(EventFrame {
            name,
            payload: data.to_string(),
        })
    }

    pub fn pending_event(&self) -> Option<&str> {
        self.pending_event.as_deref()
    }
}
