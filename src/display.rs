use crossbeam_channel::{Receiver, Sender};

/// Where translation progress ends up.
///
/// Methods are called from worker tasks; implementations forward to their
/// own event loop when the surface is not thread safe.
pub trait DisplaySink: Send + Sync {
    fn on_progress(&self, cumulative_text: &str);
    fn on_status(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Progress(String),
    Status(String),
}

/// Marshals updates onto a channel drained by the UI thread.
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    tx: Sender<DisplayEvent>,
}

impl ChannelDisplay {
    pub fn new() -> (Self, Receiver<DisplayEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl DisplaySink for ChannelDisplay {
    fn on_progress(&self, cumulative_text: &str) {
        // receiver gone means the UI closed; nothing left to update
        let _ = self.tx.send(DisplayEvent::Progress(cumulative_text.to_string()));
    }

    fn on_status(&self, message: &str) {
        let _ = self.tx.send(DisplayEvent::Status(message.to_string()));
    }
}
