//! Scripted transport and record fixtures shared by the integration tests.

use std::collections::VecDeque;
use std::io::Read;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::{future, stream};
use horizon_kit::*;
use serde_json::{Value, json};

pub const ALICE: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
pub const BOB: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
pub const TX_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";
pub const BASE_URL: &str = "https://horizon.example.com";

/// Route library logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// No backoff, so reconnect tests run instantly.
pub fn instant_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay_ms: 0,
        max_delay_ms: 0,
    }
}

/// One scripted answer to [`Transport::stream`].
pub enum Connection {
    /// The connection attempt fails.
    Refuse(TransportError),
    /// The server sends these events, then closes the connection.
    Events(Vec<SseEvent>),
    /// The server sends these events, then goes quiet forever.
    EventsThenHang(Vec<SseEvent>),
    /// The connection attempt never completes.
    Hang,
}

/// A [`Transport`] that replays scripted answers and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    gets: Mutex<VecDeque<Result<String, TransportError>>>,
    connections: Mutex<VecDeque<Connection>>,
    get_urls: Mutex<Vec<Url>>,
    stream_calls: Mutex<Vec<(Url, Option<Cursor>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, body: Value) {
        self.gets.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn respond_raw(&self, body: &str) {
        self.gets.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn fail(&self, error: TransportError) {
        self.gets.lock().unwrap().push_back(Err(error));
    }

    pub fn connection(&self, connection: Connection) {
        self.connections.lock().unwrap().push_back(connection);
    }

    pub fn get_urls(&self) -> Vec<String> {
        self.get_urls
            .lock()
            .unwrap()
            .iter()
            .map(|url| url.to_string())
            .collect()
    }

    pub fn stream_calls(&self) -> Vec<(String, Option<String>)> {
        self.stream_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, cursor)| (url.to_string(), cursor.as_ref().map(|c| c.to_string())))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: Url) -> TransportFuture<'_, String> {
        Box::pin(async move {
            self.get_urls.lock().unwrap().push(url);
            self.gets
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::status(404, "Resource Missing", None)))
        })
    }

    fn stream(&self, url: Url, last_event_id: Option<Cursor>) -> TransportFuture<'_, EventStream> {
        Box::pin(async move {
            self.stream_calls.lock().unwrap().push((url, last_event_id));
            let next = self.connections.lock().unwrap().pop_front();
            match next {
                Some(Connection::Refuse(error)) => Err(error),
                Some(Connection::Events(events)) => {
                    Ok(stream::iter(events.into_iter().map(Ok)).boxed())
                }
                Some(Connection::EventsThenHang(events)) => Ok(stream::iter(
                    events.into_iter().map(Ok),
                )
                .chain(stream::pending())
                .boxed()),
                Some(Connection::Hang) => future::pending().await,
                None => Err(TransportError::disconnected("no more scripted connections")),
            }
        })
    }
}

/// A client wired to `transport`.
pub fn horizon(transport: &Arc<ScriptedTransport>, stream_retry: RetryConfig) -> Horizon {
    Horizon::custom(BASE_URL)
        .transport(transport.clone())
        .stream_retry_config(stream_retry)
        .build()
        .unwrap()
}

/// A local server that reads each request and hangs up without answering.
///
/// Returns its base URL and the number of connections accepted so far.
pub fn hang_up_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    std::thread::spawn(move || {
        for mut socket in listener.incoming().flatten() {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf);
        }
    });
    (base_url, accepted)
}

pub fn accepted(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

// ─── Records ───

fn operation(id: &str, type_name: &str, type_i: i64, extra: Value) -> Value {
    let mut raw = json!({
        "id": id,
        "paging_token": id,
        "transaction_successful": true,
        "source_account": ALICE,
        "type": type_name,
        "type_i": type_i,
        "created_at": "2024-01-01T00:00:00Z",
        "transaction_hash": TX_HASH,
        "_links": {
            "self": { "href": format!("{}/operations/{}", BASE_URL, id) }
        }
    });
    if let (Value::Object(raw), Value::Object(extra)) = (&mut raw, extra) {
        raw.extend(extra);
    }
    raw
}

pub fn payment(id: &str) -> Value {
    operation(
        id,
        "payment",
        1,
        json!({ "asset_type": "native", "from": ALICE, "to": BOB, "amount": "5.0000000" }),
    )
}

pub fn create_account(id: &str) -> Value {
    operation(
        id,
        "create_account",
        0,
        json!({ "starting_balance": "10000.0000000", "funder": ALICE, "account": BOB }),
    )
}

pub fn unknown_operation(id: &str, type_i: i64) -> Value {
    operation(id, "from_the_future", type_i, json!({}))
}

pub fn transaction(paging_token: &str, successful: bool) -> Value {
    json!({
        "id": TX_HASH,
        "paging_token": paging_token,
        "successful": successful,
        "hash": TX_HASH,
        "ledger": 100,
        "created_at": "2024-01-01T00:00:00Z",
        "source_account": ALICE,
        "source_account_sequence": "4294967297",
        "fee_charged": "100",
        "max_fee": 1000,
        "operation_count": 1,
        "envelope_xdr": "AAAA",
        "result_xdr": "AAAA",
        "memo_type": "none",
        "signatures": []
    })
}

pub fn collection(records: Vec<Value>, next: Option<&str>) -> Value {
    let mut links = json!({ "self": { "href": format!("{}/payments", BASE_URL) } });
    if let Some(next) = next {
        links["next"] = json!({ "href": format!("{}/payments?{}", BASE_URL, next) });
    }
    json!({ "_links": links, "_embedded": { "records": records } })
}

pub fn event(id: &str, record: &Value) -> SseEvent {
    SseEvent::message(record.to_string()).with_id(id)
}

pub fn hello() -> SseEvent {
    SseEvent::message("\"hello\"").with_retry(0)
}
