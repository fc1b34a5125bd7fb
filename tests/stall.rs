use std::sync::{Arc, Mutex};
use std::time::Duration;

use lai::{Client, ErrorKind, PromptTemplate};

mod utils;

#[tokio::test]
async fn deadline_cuts_a_stalled_stream() {
    let endpoint = utils::stalling_server(utils::ndjson(&[("Hi", false)]), Duration::from_secs(5)).await;
    let client = Client::new(&endpoint, PromptTemplate::default(), Duration::from_millis(500)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let mut sink = move |cumulative: &str| recorder.lock().unwrap().push(cumulative.to_string());
    let result = client.translate("gemma3n:e4b", "Hola", &mut sink).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(result.text(), "Hi");
    assert!(result.elapsed() < Duration::from_secs(5));

    // the exchange was dropped; nothing arrives afterwards
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*seen.lock().unwrap(), vec!["Hi".to_string()]);
}
