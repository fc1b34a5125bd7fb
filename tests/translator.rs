use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::POST;
use httpmock::MockServer;
use lai::source::FixedText;
use lai::{ChannelDisplay, Client, DisplayEvent, ErrorKind, PromptTemplate, Translator};

mod utils;

fn translator(endpoint: &str, deadline: Duration) -> (Translator, crossbeam_channel::Receiver<DisplayEvent>) {
    let (display, rx) = ChannelDisplay::new();
    let client = Client::new(endpoint, PromptTemplate::default(), deadline).unwrap();
    (Translator::with_client(client, "gemma3n:e4b", Arc::new(display)), rx)
}

fn statuses(events: &[DisplayEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            DisplayEvent::Status(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

fn progress(events: &[DisplayEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            DisplayEvent::Progress(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn reports_progress_then_completion() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).body(utils::ndjson(&[("Hi", false), (" there", true)]));
        })
        .await;
    let (translator, rx) = translator(&server.base_url(), Duration::from_secs(30));
    assert_eq!(translator.model(), "gemma3n:e4b");

    let result = translator
        .translate_from(Arc::new(FixedText("Hola".into())))
        .await
        .unwrap();

    assert!(result.is_done());
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(progress(&events), vec!["Hi", "Hi there"]);
    let statuses = statuses(&events);
    assert_eq!(statuses.first(), Some(&"Getting input text..."));
    assert_eq!(statuses.get(1), Some(&"Translating input text..."));
    assert_eq!(statuses.last(), Some(&"Translation completed"));
}

#[tokio::test]
async fn empty_text_never_reaches_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).body(utils::ndjson(&[("unused", true)]));
        })
        .await;
    let (translator, rx) = translator(&server.base_url(), Duration::from_secs(30));

    let result = translator.translate_text("   ").await;

    mock.assert_calls(0);
    assert_eq!(result.error_kind(), Some(ErrorKind::Input));
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(statuses(&events), vec!["No text to translate."]);
}

#[tokio::test]
async fn failure_status_names_the_kind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500);
        })
        .await;
    let (translator, rx) = translator(&server.base_url(), Duration::from_secs(30));

    let result = translator.translate_text("Hola").await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Server));
    let events: Vec<_> = rx.try_iter().collect();
    assert!(progress(&events).is_empty());
    let last = *statuses(&events).last().unwrap();
    assert!(last.starts_with("Translation failed (ServerError)"), "{last}");
    assert!(last.contains("500"));
}

#[tokio::test]
async fn ticker_stops_before_final_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .delay(Duration::from_millis(400))
                .body(utils::ndjson(&[("Hi", true)]));
        })
        .await;
    let (translator, rx) = translator(&server.base_url(), Duration::from_secs(30));
    let translator = translator.tick_period(Duration::from_millis(50));

    translator.translate_text("Hola").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let events: Vec<_> = rx.try_iter().collect();
    let statuses = statuses(&events);
    assert!(statuses.iter().any(|s| s.starts_with("Translating... ")));
    assert_eq!(statuses.last(), Some(&"Translation completed"));
}

#[tokio::test]
async fn newer_request_owns_the_display() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate").body_includes("zebrafirst");
            then.status(200)
                .delay(Duration::from_millis(600))
                .body(utils::ndjson(&[("stale", true)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate").body_includes("zebrasecond");
            then.status(200).body(utils::ndjson(&[("fresh", true)]));
        })
        .await;
    let (translator, rx) = translator(&server.base_url(), Duration::from_secs(30));
    let translator = Arc::new(translator);

    let first = {
        let translator = Arc::clone(&translator);
        tokio::spawn(async move { translator.translate_text("zebrafirst").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = translator.translate_text("zebrasecond").await;
    let first = first.await.unwrap();

    // both requests finish; only the newer one reaches the display
    assert!(second.is_done());
    assert!(first.is_done());
    assert_eq!(first.text(), "stale");

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(progress(&events), vec!["fresh"]);
    assert_eq!(statuses(&events).last(), Some(&"Translation completed"));
    assert_eq!(
        statuses(&events).iter().filter(|s| **s == "Translation completed").count(),
        1
    );
}
