use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::Config;
use crate::display::DisplaySink;
use crate::error::{Result, SourceError, TranslateError};
use crate::result::TranslationResult;
use crate::source::{self, TextSource};
use crate::ticker::{Ticker, TICK_PERIOD};

/// Drives requests for one display surface.
///
/// Requests may overlap; the newest one owns the display. Older requests run
/// to completion and still return their result, but their progress and status
/// updates are dropped and their ticker is cancelled.
pub struct Translator {
    client: Client,
    model: String,
    stream: bool,
    copy_result: bool,
    tick_period: Duration,
    display: Arc<dyn DisplaySink>,
    current: Arc<AtomicU64>,
    active_ticker: Mutex<Option<(u64, CancellationToken)>>,
}

impl Translator {
    pub fn new(config: &Config, display: Arc<dyn DisplaySink>) -> Result<Self> {
        let client = Client::from_config(config)?;
        Ok(Self::with_client(client, config.model.clone(), display)
            .streaming(config.stream)
            .copy_result(config.copy_result))
    }

    pub fn with_client(client: Client, model: impl Into<String>, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            client,
            model: model.into(),
            stream: true,
            copy_result: false,
            tick_period: TICK_PERIOD,
            display,
            current: Arc::new(AtomicU64::new(0)),
            active_ticker: Mutex::new(None),
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn copy_result(mut self, copy: bool) -> Self {
        self.copy_result = copy;
        self
    }

    pub fn tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fetches text from `source` and translates it.
    ///
    /// A source failure is returned as `Err` after being shown on the display.
    pub async fn translate_from(&self, source: Arc<dyn TextSource>) -> std::result::Result<TranslationResult, SourceError> {
        let label = source.label();
        let gate = self.begin();
        gate.on_status(&format!("Getting {label} text..."));

        let fetched = tokio::task::spawn_blocking(move || source.fetch_text())
            .await
            .map_err(|err| SourceError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
            .and_then(|fetched| fetched);
        match fetched {
            Ok(text) => Ok(self.run(gate, &text, label).await),
            Err(err) => {
                warn!(source = label, %err, "could not fetch text");
                gate.on_status(&format!("Error reading {label} text: {err}"));
                Err(err)
            }
        }
    }

    pub async fn translate_text(&self, text: &str) -> TranslationResult {
        let gate = self.begin();
        self.run(gate, text, "input").await
    }

    fn begin(&self) -> Gate {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Gate {
            inner: Arc::clone(&self.display),
            current: Arc::clone(&self.current),
            generation,
        }
    }

    async fn run(&self, gate: Gate, text: &str, label: &str) -> TranslationResult {
        if text.trim().is_empty() {
            gate.on_status(empty_message(label));
            return TranslationResult::rejected(TranslateError::Input);
        }

        gate.on_status(&format!("Translating {label} text..."));
        let ticker = Ticker::spawn(Arc::new(gate.clone()), self.tick_period);
        self.install_ticker(gate.generation, ticker.token());

        let result = if self.stream {
            let mut sink = |cumulative: &str| gate.on_progress(cumulative);
            self.client.translate(&self.model, text, &mut sink).await
        } else {
            let result = self.client.translate_once(&self.model, text).await;
            if result.is_done() {
                gate.on_progress(result.text());
            }
            result
        };

        ticker.stop().await;
        self.release_ticker(gate.generation);

        if !gate.is_current() {
            debug!(generation = gate.generation, "request superseded, final status dropped");
            return result;
        }

        match result.error() {
            None => {
                let mut status = String::from("Translation completed");
                if self.copy_result && self.copy_to_clipboard(result.text()).await {
                    status.push_str(" (copied to clipboard)");
                }
                gate.on_status(&status);
            }
            Some(err) => gate.on_status(&format!("Translation failed ({}): {err}", err.kind())),
        }
        result
    }

    /// Cancels whichever ticker was running and records the new one.
    fn install_ticker(&self, generation: u64, token: CancellationToken) {
        let mut active = self.active_ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, previous)) = active.take() {
            previous.cancel();
        }
        if generation == self.current.load(Ordering::SeqCst) {
            *active = Some((generation, token));
        } else {
            token.cancel();
        }
    }

    fn release_ticker(&self, generation: u64) {
        let mut active = self.active_ticker.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(active.as_ref(), Some((g, _)) if *g == generation) {
            *active = None;
        }
    }

    async fn copy_to_clipboard(&self, text: &str) -> bool {
        let text = text.to_string();
        match tokio::task::spawn_blocking(move || source::write_clipboard(text)).await {
            Ok(Ok(())) => {
                info!("translation copied to clipboard");
                true
            }
            Ok(Err(err)) => {
                warn!(%err, "failed to write clipboard");
                false
            }
            Err(err) => {
                warn!(%err, "clipboard task failed");
                false
            }
        }
    }
}

fn empty_message(label: &str) -> &'static str {
    match label {
        "clipboard" => "Clipboard is empty.",
        "selected" => "No text selected.",
        _ => "No text to translate.",
    }
}

/// Display handle that goes quiet once a newer request starts.
#[derive(Clone)]
struct Gate {
    inner: Arc<dyn DisplaySink>,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Gate {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

impl DisplaySink for Gate {
    fn on_progress(&self, cumulative_text: &str) {
        if self.is_current() {
            self.inner.on_progress(cumulative_text);
        }
    }

    fn on_status(&self, message: &str) {
        if self.is_current() {
            self.inner.on_status(message);
        }
    }
}
