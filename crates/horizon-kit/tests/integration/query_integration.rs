//! Integration tests for one-shot queries: request rendering, envelope
//! unwrapping and error reporting.

use horizon_kit::*;
use serde_json::json;

use crate::fixtures::*;

// =============================================================================
// Request rendering
// =============================================================================

#[tokio::test]
async fn test_transactions_in_ledger_include_failed() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(
        vec![transaction("429496729600", true), transaction("429496729601", false)],
        None,
    ));
    let horizon = horizon(&transport, RetryConfig::none());

    let page = horizon
        .transactions()
        .for_ledger(100)
        .include_failed(true)
        .await
        .unwrap()
        .page()
        .unwrap();

    assert_eq!(
        transport.get_urls(),
        vec!["https://horizon.example.com/ledgers/100/transactions?include_failed=true"]
    );
    assert_eq!(page.len(), 2);
    assert!(page.records[0].is_successful());
    assert!(!page.records[1].is_successful());
}

#[tokio::test]
async fn test_trade_aggregations_page() {
    let transport = ScriptedTransport::new();
    let bucket = |timestamp: i64, trades: i64| {
        json!({
            "timestamp": timestamp,
            "trade_count": trades,
            "base_volume": "100.0000000",
            "counter_volume": "12.5000000",
            "avg": "0.1250000",
            "high": "0.1500000",
            "high_r": { "N": 3, "D": 20 },
            "low": "0.1000000",
            "low_r": { "N": 1, "D": 10 },
            "open": "0.1000000",
            "open_r": { "N": 1, "D": 10 },
            "close": "0.1500000",
            "close_r": { "N": 3, "D": 20 }
        })
    };
    transport.respond(collection(
        vec![bucket(1517521200000, 4), bucket(1517524800000, 2)],
        None,
    ));
    let horizon = horizon(&transport, RetryConfig::none());

    let page = horizon
        .trade_aggregations()
        .base_asset(&Asset::native())
        .counter_asset(&Asset::credit("USD", BOB))
        .resolution(3_600_000)
        .start_time(1517521200000)
        .await
        .unwrap()
        .page()
        .unwrap();

    assert_eq!(
        transport.get_urls(),
        vec![format!(
            "https://horizon.example.com/trade_aggregations?base_asset_type=native\
             &counter_asset_type=credit_alphanum4&counter_asset_code=USD\
             &counter_asset_issuer={}&resolution=3600000&start_time=1517521200000",
            BOB
        )]
    );
    assert_eq!(page.len(), 2);
    assert_eq!(page.records[0].trade_count, 4);
    assert_eq!(page.records[1].high_r, Price { n: 3, d: 20 });
    assert_eq!(page.records[1].paging_token(), &Cursor::new("1517524800000"));
}

#[tokio::test]
async fn test_invalid_query_never_reaches_transport() {
    let transport = ScriptedTransport::new();
    let horizon = horizon(&transport, RetryConfig::none());

    let err = horizon.transactions().transaction("not-a-hash").await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "endpoint"));
    assert!(transport.get_urls().is_empty());
}

#[tokio::test]
async fn test_query_params_and_cursor_rendering() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(vec![], None));
    let horizon = horizon(&transport, RetryConfig::none());

    horizon
        .payments()
        .for_account(ALICE)
        .order(Order::Desc)
        .limit(5)
        .cursor("12884905985")
        .await
        .unwrap();

    assert_eq!(
        transport.get_urls(),
        vec![format!(
            "https://horizon.example.com/accounts/{}/payments?order=desc&limit=5&cursor=12884905985",
            ALICE
        )]
    );
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(vec![], None));
    let horizon = Horizon::custom("https://gateway.example.com/horizon")
        .transport(transport.clone())
        .build()
        .unwrap();

    horizon.ledgers().limit(1).await.unwrap();

    assert_eq!(
        transport.get_urls(),
        vec!["https://gateway.example.com/horizon/ledgers?limit=1"]
    );
}

// =============================================================================
// Envelopes and pagination
// =============================================================================

#[tokio::test]
async fn test_payments_collection_decoded_in_order() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(
        vec![payment("12884905986"), create_account("12884905987")],
        Some("cursor=12884905987&limit=2&order=asc"),
    ));
    let horizon = horizon(&transport, RetryConfig::none());

    let page = horizon.payments().limit(2).await.unwrap().page().unwrap();

    let kinds: Vec<_> = page.iter().map(OperationRecord::kind).collect();
    assert_eq!(kinds, vec![OperationKind::Payment, OperationKind::CreateAccount]);
    assert_eq!(page.next_cursor(), Some(Cursor::new("12884905987")));
}

#[tokio::test]
async fn test_next_page_follows_link() {
    let transport = ScriptedTransport::new();
    transport.respond(collection(
        vec![payment("10"), payment("11")],
        Some("cursor=11&limit=2&order=asc"),
    ));
    transport.respond(collection(vec![payment("12")], None));
    let horizon = horizon(&transport, RetryConfig::none());

    let first = horizon.payments().limit(2).await.unwrap().page().unwrap();
    let second = horizon
        .payments()
        .next_page(&first)
        .await
        .unwrap()
        .page()
        .unwrap();

    assert_eq!(second.records[0].id(), "12");
    assert_eq!(
        transport.get_urls()[1],
        "https://horizon.example.com/payments?limit=2&order=asc&cursor=11"
    );
}

#[tokio::test]
async fn test_single_record_response() {
    let transport = ScriptedTransport::new();
    transport.respond(payment("12884905986"));
    let horizon = horizon(&transport, RetryConfig::none());

    let response = horizon.operations().operation(12884905986u64).await.unwrap();

    let op = response.single().unwrap();
    assert_eq!(op.kind(), OperationKind::Payment);
    assert_eq!(op.transaction_hash(), TX_HASH);
}

#[tokio::test]
async fn test_fee_stats() {
    let transport = ScriptedTransport::new();
    let distribution = |fee: i64| {
        json!({
            "max": fee, "min": fee, "mode": fee, "p10": fee, "p20": fee, "p30": fee,
            "p40": fee, "p50": fee, "p60": fee, "p70": fee, "p80": fee, "p90": fee,
            "p95": fee, "p99": fee
        })
    };
    transport.respond(json!({
        "last_ledger": "22606298",
        "last_ledger_base_fee": "100",
        "ledger_capacity_usage": "0.5",
        "fee_charged": distribution(100),
        "max_fee": distribution(300)
    }));
    let horizon = horizon(&transport, RetryConfig::none());

    let stats = horizon.fee_stats().await.unwrap();

    assert_eq!(stats.fee_charged.p50, 100);
    assert_eq!(stats.max_fee.p99, 300);
    assert_eq!(transport.get_urls(), vec!["https://horizon.example.com/fee_stats"]);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_not_found_is_transport_error() {
    let transport = ScriptedTransport::new();
    transport.fail(TransportError::status(404, "Resource Missing", None));
    let horizon = horizon(&transport, RetryConfig::none());

    let err = horizon.ledgers().ledger(99_999_999).await.unwrap_err();

    match err {
        Error::Transport(e) => assert!(e.is_not_found()),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_object_payload_is_malformed() {
    let transport = ScriptedTransport::new();
    transport.respond_raw("[1, 2, 3]");
    let horizon = horizon(&transport, RetryConfig::none());

    let err = horizon.ledgers().await.unwrap_err();

    assert!(matches!(err, Error::Decode(DecodeError::MalformedEnvelope(_))));
}
