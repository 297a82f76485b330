//! Streaming replies — SSE frame decoding and stream collection.
//!
//! OpenAI-compatible endpoints stream `data: {json}` lines terminated by
//! `data: [DONE]`. A [`ChatStream`] is finite and not restartable.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::debug;

use neno_core::types::{ChatCompletionChunk, ProviderResponse, StreamDelta};

use crate::error::ProviderError;

/// Lazy sequence of text fragments from one provider call.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamDelta, ProviderError>> + Send>>;

/// The answer of a registry call: complete text, or a live stream.
pub enum Reply {
    Complete(ProviderResponse),
    /// Live stream from the adapter registered as `provider`.
    Stream { provider: String, stream: ChatStream },
}

impl Reply {
    /// Wait for the whole answer, draining the stream if there is one.
    pub async fn into_response(self) -> Result<ProviderResponse, ProviderError> {
        match self {
            Reply::Complete(resp) => Ok(resp),
            Reply::Stream { provider, stream } => collect_stream(stream, &provider).await,
        }
    }

    /// Name of the adapter that produced this reply.
    pub fn provider(&self) -> &str {
        match self {
            Reply::Complete(resp) => &resp.provider,
            Reply::Stream { provider, .. } => provider,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Reply::Stream { .. })
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Complete(resp) => f.debug_tuple("Complete").field(resp).finish(),
            Reply::Stream { provider, .. } => f
                .debug_struct("Stream")
                .field("provider", provider)
                .finish_non_exhaustive(),
        }
    }
}

/// Concatenate every fragment of a stream into one response.
///
/// The first stream error aborts collection.
pub async fn collect_stream(
    mut stream: ChatStream,
    provider: &str,
) -> Result<ProviderResponse, ProviderError> {
    let mut content = String::new();
    let mut model = String::new();
    let mut source = provider.to_string();

    while let Some(item) = stream.next().await {
        let delta = item?;
        content.push_str(&delta.delta);
        if let Some(m) = delta.model {
            model = m;
        }
        source = delta.provider;
    }

    Ok(ProviderResponse::new(content, model, source))
}

// ─────────────────────────────────────────────
// SSE decoding
// ─────────────────────────────────────────────

struct SseState<S> {
    inner: Pin<Box<S>>,
    /// Raw bytes; decoded a complete line at a time so a multi-byte
    /// character split across chunks stays intact.
    buffer: Vec<u8>,
    pending: VecDeque<Result<StreamDelta, ProviderError>>,
    finished: bool,
    provider: String,
}

impl<S> SseState<S> {
    /// Decode every complete line currently in the buffer.
    fn drain_lines(&mut self) {
        while !self.finished {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_bytes(&line);
        }
    }

    fn handle_bytes(&mut self, line: &[u8]) {
        match std::str::from_utf8(line) {
            Ok(text) => self.handle_line(text.trim()),
            Err(e) => {
                debug!(provider = %self.provider, error = %e, "skipping non-UTF-8 SSE line");
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.finished = true;
            self.buffer.clear();
            return;
        }

        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => {
                if let Some(text) = chunk.delta_text() {
                    self.pending.push_back(Ok(StreamDelta {
                        delta: text.to_string(),
                        model: chunk.model.clone(),
                        provider: self.provider.clone(),
                    }));
                }
            }
            Err(e) => {
                debug!(provider = %self.provider, error = %e, "skipping undecodable SSE frame");
            }
        }
    }
}

/// Turn a raw byte stream of SSE frames into a [`ChatStream`].
pub fn sse_deltas<S, B, E>(bytes: S, provider: impl Into<String>) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        inner: Box::pin(bytes),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
        provider: provider.into(),
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.extend_from_slice(chunk.as_ref());
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(ProviderError::Stream(e.to_string())));
                }
                None => {
                    // Body ended without [DONE]: flush a trailing unterminated line.
                    let rest = std::mem::take(&mut st.buffer);
                    st.handle_bytes(&rest);
                    st.finished = true;
                }
            }
        }
    }))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
