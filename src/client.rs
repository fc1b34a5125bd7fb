use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result, TranslateError};
use crate::prompt::PromptTemplate;
use crate::protocol::{response_frames, GenerationFrame, GenerationRequest};
use crate::result::TranslationResult;

const GENERATE_PATH: &str = "/api/generate";

/// Receives the cumulative text after every decoded frame.
pub trait FrameHandler {
    fn on_frame(&mut self, cumulative: &str);
}

impl<F: FnMut(&str)> FrameHandler for F {
    fn on_frame(&mut self, cumulative: &str) {
        self(cumulative)
    }
}

/// Client for the Ollama generate endpoint.
///
/// Every call is independent; nothing is shared between requests besides the
/// connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    generate_url: String,
    template: PromptTemplate,
    deadline: Duration,
}

impl Client {
    pub fn new(endpoint: &str, template: PromptTemplate, deadline: Duration) -> Result<Self> {
        let base = endpoint.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidEndpoint(endpoint.to_string()));
        }
        let http = reqwest::Client::builder().timeout(deadline).build()?;
        Ok(Self {
            http,
            generate_url: format!("{base}{GENERATE_PATH}"),
            template,
            deadline,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.endpoint, config.template(), config.deadline())
    }

    pub fn generate_url(&self) -> &str {
        &self.generate_url
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Streams one translation, calling `sink` once per frame with the text so far.
    ///
    /// The deadline covers the whole exchange. When it fires the connection is
    /// dropped and `sink` is not called again.
    pub async fn translate<H: FrameHandler>(
        &self,
        model: &str,
        source_text: &str,
        sink: &mut H,
    ) -> TranslationResult {
        if source_text.trim().is_empty() {
            return TranslationResult::rejected(TranslateError::Input);
        }
        let mut result = TranslationResult::start();
        let prompt = self.template.render(source_text);
        let request = GenerationRequest { model, prompt: &prompt, stream: true };
        info!(model, chars = source_text.len(), url = %self.generate_url, "translation started");

        let exchange = self.stream_frames(&request, &mut result, sink);
        let outcome = tokio::time::timeout(self.deadline, exchange).await;
        match outcome {
            Ok(Ok(())) => result.finish(),
            Ok(Err(err)) => result.fail(err),
            Err(_) => result.fail(TranslateError::Timeout(self.deadline)),
        }
        log_outcome(&result);
        result
    }

    /// Single-object variant: `stream: false`, the whole answer in one body.
    pub async fn translate_once(&self, model: &str, source_text: &str) -> TranslationResult {
        if source_text.trim().is_empty() {
            return TranslationResult::rejected(TranslateError::Input);
        }
        let mut result = TranslationResult::start();
        let prompt = self.template.render(source_text);
        let request = GenerationRequest { model, prompt: &prompt, stream: false };
        info!(model, chars = source_text.len(), url = %self.generate_url, "translation started (single response)");

        let outcome = tokio::time::timeout(self.deadline, self.fetch_single(&request)).await;
        match outcome {
            Ok(Ok(frame)) => {
                result.set_text(frame.response.trim().to_string());
                result.finish();
            }
            Ok(Err(err)) => result.fail(err),
            Err(_) => result.fail(TranslateError::Timeout(self.deadline)),
        }
        log_outcome(&result);
        result
    }

    async fn send(&self, request: &GenerationRequest<'_>) -> std::result::Result<reqwest::Response, TranslateError> {
        let response = self
            .http
            .post(&self.generate_url)
            .json(request)
            .send()
            .await
            .map_err(|err| TranslateError::from_reqwest(err, self.deadline))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Server { status, detail: error_detail(&body) });
        }
        Ok(response)
    }

    async fn stream_frames<H: FrameHandler>(
        &self,
        request: &GenerationRequest<'_>,
        result: &mut TranslationResult,
        sink: &mut H,
    ) -> std::result::Result<(), TranslateError> {
        let response = self.send(request).await?;
        let status = response.status();
        let mut frames = response_frames(response, self.deadline);
        let mut count = 0usize;

        while let Some(frame) = frames.next_frame().await? {
            if let Some(detail) = frame.error {
                return Err(TranslateError::Server { status, detail });
            }
            count += 1;
            result.append(&frame.response);
            sink.on_frame(result.text());
            if frame.done {
                debug!(frames = count, reason = ?frame.done_reason, "terminal frame");
                return Ok(());
            }
        }
        debug!(frames = count, "stream ended without terminal frame");
        Ok(())
    }

    async fn fetch_single(&self, request: &GenerationRequest<'_>) -> std::result::Result<GenerationFrame, TranslateError> {
        let response = self.send(request).await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TranslateError::from_reqwest(err, self.deadline))?;
        let frame: GenerationFrame =
            serde_json::from_slice(&body).map_err(|err| TranslateError::Decode(err.to_string()))?;
        match frame.error {
            Some(detail) => Err(TranslateError::Server { status, detail }),
            None => Ok(frame),
        }
    }
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}

fn log_outcome(result: &TranslationResult) {
    match result.error() {
        None => info!(chars = result.text().len(), elapsed = ?result.elapsed(), "translation done"),
        Some(err) => warn!(kind = %err.kind(), %err, partial_chars = result.text().len(), "translation failed"),
    }
}
