//! Integration tests for live streams: resume, reconnect budget and close.

use std::time::Duration;

use futures::StreamExt;
use horizon_kit::*;

use crate::fixtures::*;

fn ids(records: &[OperationRecord]) -> Vec<&str> {
    records.iter().map(OperationRecord::id).collect()
}

// =============================================================================
// Resume
// =============================================================================

#[tokio::test]
async fn test_stream_resumes_after_disconnect() {
    init_tracing();
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Events(vec![
        hello(),
        event("12344", &payment("12344")),
        event("12345", &payment("12345")),
    ]));
    transport.connection(Connection::Events(vec![
        event("12345", &payment("12345")),
        event("12346", &payment("12346")),
    ]));
    let horizon = horizon(&transport, instant_retry(3));

    let mut session = horizon.payments().session().unwrap();
    let mut delivered = Vec::new();
    for _ in 0..3 {
        delivered.push(session.next_record().await.unwrap().unwrap());
    }

    assert_eq!(ids(&delivered), vec!["12344", "12345", "12346"]);
    assert_eq!(session.cursor(), Some(&Cursor::new("12346")));
    assert_eq!(session.failures(), 0);
    assert_eq!(
        transport.stream_calls(),
        vec![
            ("https://horizon.example.com/payments?cursor=now".to_string(), None),
            (
                "https://horizon.example.com/payments?cursor=12345".to_string(),
                Some("12345".to_string())
            ),
        ]
    );
}

#[tokio::test]
async fn test_stream_starts_from_explicit_cursor() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![event("101", &payment("101"))]));
    let horizon = horizon(&transport, instant_retry(0));

    let mut session = horizon
        .payments()
        .for_account(ALICE)
        .cursor("100")
        .session()
        .unwrap();
    assert_eq!(session.cursor(), Some(&Cursor::new("100")));

    let first = session.next_record().await.unwrap().unwrap();
    assert_eq!(first.id(), "101");
    assert_eq!(
        transport.stream_calls()[0].0,
        format!("https://horizon.example.com/accounts/{}/payments?cursor=100", ALICE)
    );
    session.close();
}

#[tokio::test]
async fn test_record_stream_tracks_cursor() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![
        hello(),
        event("5", &create_account("5")),
        event("6", &payment("6")),
    ]));
    let horizon = horizon(&transport, instant_retry(0));

    let mut stream = horizon.operations().stream().unwrap();
    let first = stream.next().await.unwrap().unwrap();
    let second = stream.next().await.unwrap().unwrap();

    assert_eq!(first.kind(), OperationKind::CreateAccount);
    assert_eq!(second.kind(), OperationKind::Payment);
    assert_eq!(stream.cursor(), Some(&Cursor::new("6")));
    assert_eq!(stream.state(), Some(StreamState::Streaming));

    stream.close();
    assert!(stream.next().await.is_none());
    assert!(stream.close_handle().is_closed());
}

// =============================================================================
// Reconnect budget
// =============================================================================

#[tokio::test]
async fn test_stream_gives_up_after_budget() {
    init_tracing();
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.connection(Connection::Refuse(TransportError::status(
            503,
            "Service Unavailable",
            None,
        )));
    }
    let horizon = horizon(&transport, instant_retry(2));

    let mut session = horizon.ledgers().cursor("now").session().unwrap();
    let err = session.next_record().await.unwrap().unwrap_err();

    match err {
        Error::StreamInterrupted {
            attempts,
            cursor,
            source,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(cursor, Some(Cursor::now()));
            assert_eq!(source.status_code(), Some(503));
        }
        other => panic!("expected StreamInterrupted, got {:?}", other),
    }
    assert_eq!(transport.stream_calls().len(), 3);
    assert_eq!(session.state(), StreamState::Closed);
    assert!(session.next_record().await.is_none());
}

#[tokio::test]
async fn test_retry_budget_resets_after_delivery() {
    init_tracing();
    let transport = ScriptedTransport::new();
    for id in ["1", "2", "3"] {
        transport.connection(Connection::Events(vec![event(id, &payment(id))]));
    }
    let horizon = horizon(&transport, instant_retry(1));

    let mut session = horizon.payments().session().unwrap();
    let mut delivered = Vec::new();
    let err = loop {
        match session.next_record().await {
            Some(Ok(record)) => delivered.push(record),
            Some(Err(e)) => break e,
            None => panic!("stream ended without an error"),
        }
    };

    assert_eq!(ids(&delivered), vec!["1", "2", "3"]);
    assert!(err.is_stream_interrupted());
    match err {
        Error::StreamInterrupted {
            attempts, cursor, ..
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(cursor, Some(Cursor::new("3")));
        }
        other => panic!("expected StreamInterrupted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dropped_connection_is_retried() {
    init_tracing();
    let (base_url, connections) = hang_up_server();
    let horizon = Horizon::custom(base_url)
        .stream_retry_config(instant_retry(2))
        .build()
        .unwrap();

    let mut session = horizon.ledgers().session().unwrap();
    let err = session.next_record().await.unwrap().unwrap_err();

    assert!(err.is_stream_interrupted(), "got {:?}", err);
    match err {
        Error::StreamInterrupted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, TransportError::Http(_)));
            assert_eq!(source.status_code(), None);
        }
        other => panic!("expected StreamInterrupted, got {:?}", other),
    }
    assert_eq!(accepted(&connections), 3);
    assert_eq!(session.state(), StreamState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_server_retry_hint_replaces_initial_delay() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Events(vec![event("1", &payment("1"))]));
    transport.connection(Connection::Events(vec![
        SseEvent::message("\"hello\"").with_retry(250),
        event("2", &payment("2")),
    ]));
    transport.connection(Connection::EventsThenHang(vec![event("3", &payment("3"))]));
    let horizon = horizon(
        &transport,
        RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
        },
    );

    let mut session = horizon.payments().session().unwrap();
    assert_eq!(session.next_record().await.unwrap().unwrap().id(), "1");

    let started = tokio::time::Instant::now();
    assert_eq!(session.next_record().await.unwrap().unwrap().id(), "2");
    let configured = started.elapsed();

    let started = tokio::time::Instant::now();
    assert_eq!(session.next_record().await.unwrap().unwrap().id(), "3");
    let hinted = started.elapsed();

    assert!(configured >= Duration::from_millis(1000), "waited {:?}", configured);
    assert!(hinted >= Duration::from_millis(250), "waited {:?}", hinted);
    assert!(hinted < Duration::from_millis(1000), "waited {:?}", hinted);
    assert_eq!(transport.stream_calls().len(), 3);
    session.close();
}

#[tokio::test]
async fn test_not_found_is_fatal_immediately() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Refuse(TransportError::status(
        404,
        "Resource Missing",
        None,
    )));
    let horizon = horizon(&transport, instant_retry(5));

    let mut session = horizon.transactions().session().unwrap();
    let err = session.open().await.unwrap_err();

    match err {
        Error::Transport(e) => assert!(e.is_not_found()),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(transport.stream_calls().len(), 1);
    assert_eq!(session.state(), StreamState::Closed);
}

// =============================================================================
// Decoding on the stream
// =============================================================================

#[tokio::test]
async fn test_collection_event_is_malformed() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![SseEvent::message(
        collection(vec![payment("1")], None).to_string(),
    )]));
    let horizon = horizon(&transport, instant_retry(3));

    let mut session = horizon.payments().session().unwrap();
    let err = session.next_record().await.unwrap().unwrap_err();

    assert!(matches!(err, Error::Decode(DecodeError::MalformedEnvelope(_))));
    assert_eq!(session.state(), StreamState::Closed);
}

#[tokio::test]
async fn test_unknown_variant_on_stream_is_terminal() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![
        event("1", &payment("1")),
        event("2", &unknown_operation("2", 77)),
    ]));
    let horizon = horizon(&transport, instant_retry(3));

    let mut session = horizon.operations().session().unwrap();
    assert!(session.next_record().await.unwrap().is_ok());
    let err = session.next_record().await.unwrap().unwrap_err();

    assert!(err.is_unsupported_variant());
    assert_eq!(session.cursor(), Some(&Cursor::new("1")));
    assert!(session.next_record().await.is_none());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_open_twice_and_after_close() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![hello()]));
    let horizon = horizon(&transport, instant_retry(0));

    let mut session = horizon.ledgers().session().unwrap();
    assert_eq!(session.state(), StreamState::Idle);

    session.open().await.unwrap();
    assert_eq!(session.state(), StreamState::Streaming);
    assert!(matches!(session.open().await, Err(Error::StreamAlreadyOpen)));

    session.close();
    session.close();
    assert_eq!(session.state(), StreamState::Closed);
    assert!(matches!(session.open().await, Err(Error::StreamClosed)));
    assert_eq!(transport.stream_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_handle_interrupts_pending_read() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::EventsThenHang(vec![event("1", &payment("1"))]));
    let horizon = horizon(&transport, instant_retry(0));

    let mut session = horizon.payments().session().unwrap();
    let handle = session.close_handle();
    assert!(session.next_record().await.unwrap().is_ok());

    let (next, ()) = tokio::join!(session.next_record(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.close_and_wait().await;
    });

    assert!(next.is_none());
    assert!(handle.is_closed());
    assert_eq!(session.state(), StreamState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_close_during_backoff() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Events(vec![event("1", &payment("1"))]));
    transport.connection(Connection::EventsThenHang(vec![event("2", &payment("2"))]));
    let horizon = horizon(
        &transport,
        RetryConfig {
            max_retries: 5,
            initial_delay_ms: 10_000,
            max_delay_ms: 10_000,
        },
    );

    let mut session = horizon.payments().session().unwrap();
    let handle = session.close_handle();
    assert!(session.next_record().await.unwrap().is_ok());

    let (next, ()) = tokio::join!(session.next_record(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.close_and_wait().await;
    });

    assert!(next.is_none());
    assert_eq!(session.state(), StreamState::Closed);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.stream_calls().len(), 1);
    assert!(session.next_record().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_close_during_hanging_connect() {
    let transport = ScriptedTransport::new();
    transport.connection(Connection::Refuse(TransportError::status(
        503,
        "Service Unavailable",
        None,
    )));
    transport.connection(Connection::Hang);
    let horizon = horizon(
        &transport,
        RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 100,
        },
    );

    let mut session = horizon.ledgers().session().unwrap();
    let handle = session.close_handle();

    let (next, ()) = tokio::join!(session.next_record(), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.close_and_wait().await;
    });

    assert!(next.is_none());
    assert_eq!(session.state(), StreamState::Closed);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.stream_calls().len(), 2);
}

#[tokio::test]
async fn test_close_before_open() {
    let transport = ScriptedTransport::new();
    let horizon = horizon(&transport, instant_retry(0));

    let mut session = horizon.effects().session().unwrap();
    session.close_handle().close();

    assert!(matches!(session.open().await, Err(Error::StreamClosed)));
    assert!(transport.stream_calls().is_empty());
}
