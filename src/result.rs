use std::time::{Duration, Instant};

use crate::error::{ErrorKind, TranslateError};

#[derive(Debug)]
pub enum TranslationState {
    InProgress,
    Done,
    Failed(TranslateError),
}

/// Accumulated output of one request.
///
/// Text only grows while the state is `InProgress`; once `Done` or `Failed`
/// every mutator is a no-op.
#[derive(Debug)]
pub struct TranslationResult {
    text: String,
    state: TranslationState,
    started: Instant,
    elapsed: Option<Duration>,
}

impl TranslationResult {
    pub fn start() -> Self {
        Self {
            text: String::new(),
            state: TranslationState::InProgress,
            started: Instant::now(),
            elapsed: None,
        }
    }

    /// A result that failed before any work began.
    pub fn rejected(err: TranslateError) -> Self {
        let mut result = Self::start();
        result.fail(err);
        result
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn state(&self) -> &TranslationState {
        &self.state
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, TranslationState::InProgress)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, TranslationState::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, TranslationState::Failed(_))
    }

    pub fn error(&self) -> Option<&TranslateError> {
        match &self.state {
            TranslationState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(TranslateError::kind)
    }

    /// Time since the request started, frozen once it settles.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    pub(crate) fn append(&mut self, fragment: &str) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.text.push_str(fragment);
        true
    }

    /// Replaces the text wholesale; only used for single-object responses.
    pub(crate) fn set_text(&mut self, text: String) {
        if self.is_in_progress() {
            self.text = text;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.settle(TranslationState::Done);
    }

    pub(crate) fn fail(&mut self, err: TranslateError) {
        self.settle(TranslationState::Failed(err));
    }

    fn settle(&mut self, state: TranslationState) {
        if self.is_in_progress() {
            self.elapsed = Some(self.started.elapsed());
            self.state = state;
        }
    }
}
