//! Integration tests for the blocking adapters.

#![cfg(feature = "blocking")]

use horizon_kit::*;

use crate::fixtures::*;

#[test]
fn test_call_blocking() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(vec![payment("1"), create_account("2")], None));
    let horizon = horizon(&transport, RetryConfig::none());

    let records = horizon
        .payments()
        .for_ledger(100)
        .call_blocking()
        .unwrap()
        .into_records();

    assert_eq!(records.len(), 2);
    assert_eq!(
        transport.get_urls(),
        vec!["https://horizon.example.com/ledgers/100/payments"]
    );
}

#[test]
fn test_stream_blocking_iterates_and_resumes() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Events(vec![hello(), event("1", &payment("1"))]));
    transport.connection(Connection::EventsThenHang(vec![
        event("1", &payment("1")),
        event("2", &payment("2")),
    ]));
    let horizon = horizon(&transport, instant_retry(2));

    let mut stream = horizon.payments().stream_blocking().unwrap();
    let ids: Vec<String> = stream
        .by_ref()
        .take(2)
        .map(|record| record.unwrap().id().to_string())
        .collect();

    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(stream.cursor(), Some(&Cursor::new("2")));

    stream.close();
    assert!(stream.next().is_none());
    assert_eq!(stream.state(), Some(StreamState::Closed));
}

#[test]
fn test_stream_blocking_reports_interruption() {
    let transport = ScriptedTransport::new();
    let horizon = horizon(&transport, instant_retry(1));

    let mut stream = horizon.ledgers().stream_blocking().unwrap();
    let err = stream.next().unwrap().unwrap_err();

    assert!(err.is_stream_interrupted());
    assert!(stream.next().is_none());
    assert_eq!(transport.stream_calls().len(), 2);
}
