//! Wire format of the Ollama `/api/generate` endpoint.
//!
//! Requests are a single JSON object. In streaming mode the response body is
//! newline-delimited JSON, one [`GenerationFrame`] per line, the last one
//! carrying `"done": true`.

use std::time::Duration;

use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::io::StreamReader;

use crate::error::TranslateError;

#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// One decoded line of the response body.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GenerationFrame {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Set by the server when generation fails after the stream started.
    #[serde(default)]
    pub error: Option<String>,
}

/// Pulls frames off an NDJSON body.
///
/// `Ok(None)` is the end of the stream; it is never produced for a read or
/// parse failure.
pub struct FrameReader<R> {
    lines: Lines<R>,
    deadline: Duration,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, deadline: Duration) -> Self {
        Self { lines: reader.lines(), deadline }
    }

    pub async fn next_frame(&mut self) -> Result<Option<GenerationFrame>, TranslateError> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(err) => return Err(TranslateError::from_io(err, self.deadline)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str::<GenerationFrame>(line)
                .map(Some)
                .map_err(|err| TranslateError::Decode(err.to_string()));
        }
    }
}

/// Frames of a streamed reqwest body.
pub fn response_frames(
    response: reqwest::Response,
    deadline: Duration,
) -> FrameReader<impl AsyncBufRead + Unpin> {
    let body = response
        .bytes_stream()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
    FrameReader::new(StreamReader::new(Box::pin(body)), deadline)
}
