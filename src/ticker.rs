use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::display::DisplaySink;

pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Periodic "Translating... N.Ns" status while a request is in flight.
///
/// Dropping the ticker cancels it; [`Ticker::stop`] also waits for the task so
/// no tick can land after the caller's final status.
pub struct Ticker {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(display: Arc<dyn DisplaySink>, period: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(display, period, token.clone()));
        Self { token, handle: Some(handle) }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(%err, "ticker task failed");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(display: Arc<dyn DisplaySink>, period: Duration, token: CancellationToken) {
    let start = Instant::now();
    let mut interval = time::interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let secs = start.elapsed().as_secs_f64();
                display.on_status(&format!("Translating... {secs:.1}s"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl DisplaySink for Recorder {
        fn on_progress(&self, _: &str) {}
        fn on_status(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_stopped() {
        let recorder = Arc::new(Recorder::default());
        let ticker = Ticker::spawn(recorder.clone(), TICK_PERIOD);

        time::sleep(Duration::from_millis(350)).await;
        ticker.stop().await;
        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(seen, vec!["Translating... 0.1s", "Translating... 0.2s", "Translating... 0.3s"]);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(recorder.0.lock().unwrap().len(), 3);
    }

    struct Exploding;

    impl DisplaySink for Exploding {
        fn on_progress(&self, _: &str) {}
        fn on_status(&self, _: &str) {
            panic!("display went away");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_survives_a_panicking_display() {
        let ticker = Ticker::spawn(Arc::new(Exploding), TICK_PERIOD);
        time::sleep(Duration::from_millis(150)).await;
        // the task already died; stopping still completes and reports it
        ticker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let recorder = Arc::new(Recorder::default());
        let ticker = Ticker::spawn(recorder.clone(), TICK_PERIOD);
        let token = ticker.token();
        drop(ticker);
        assert!(token.is_cancelled());

        time::sleep(Duration::from_secs(1)).await;
        assert!(recorder.0.lock().unwrap().is_empty());
    }
}
