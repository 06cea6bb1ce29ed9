//! Live record streams.
//!
//! [`StreamSession`] is the single state machine behind every live feed:
//!
//! ```text
//! Idle ──open()──► Connecting ──► Streaming ◄──► Reconnecting
//!                      │              │               │
//!                      └──────────────┴───────────────┴──► Closed
//! ```
//!
//! The session owns at most one connection. Every delivered record advances
//! the session cursor, which is the resume point for reconnects: the next
//! connection asks for records strictly after it (URL `cursor` plus the
//! `Last-Event-ID` header). Horizon may still replay the record at the
//! cursor, so records at or before it are dropped as duplicates and the
//! delivered cursors are strictly increasing.
//!
//! [`RecordStream`] adapts a session to [`futures::Stream`];
//! [`BlockingRecordStream`](super::BlockingRecordStream) drives the same
//! session from a plain iterator.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, Either};
use futures::{Stream, StreamExt};
use reqwest::Url;
use tokio::sync::watch;

use super::sse::SseEvent;
use super::transport::{EventStream, RetryConfig, Transport, backoff_delay};
use crate::error::{DecodeError, Error, TransportError};
use crate::types::{Cursor, Envelope, Record, RequestDescriptor, classify};

/// Lifecycle state of a [`StreamSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Created, not yet connected.
    Idle,
    /// Opening the first connection.
    Connecting,
    /// Connected and reading events.
    Streaming,
    /// Waiting to reopen after a disconnect.
    Reconnecting,
    /// Terminal; no connection is held.
    Closed,
}

/// Requests that a session close, from any task.
///
/// The session observes the request while connecting, while sleeping
/// before a reconnect and while waiting for the next event, and releases
/// its connection right away.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    signal: Arc<watch::Sender<bool>>,
    released: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Ask the session to close.
    pub fn close(&self) {
        self.signal.send_replace(true);
    }

    /// Returns true once the session has released its connection.
    pub fn is_closed(&self) -> bool {
        *self.released.borrow()
    }

    /// Ask the session to close and wait until it has released its
    /// connection.
    ///
    /// The session must still be driven (or dropped) for this to resolve.
    pub async fn close_and_wait(&self) {
        self.close();
        let mut released = self.released.subscribe();
        let _ = released.wait_for(|done| *done).await;
    }
}

/// A live feed of records of type `R`.
pub struct StreamSession<R> {
    transport: Arc<dyn Transport>,
    base_url: Url,
    descriptor: RequestDescriptor,
    retry: RetryConfig,
    state: StreamState,
    connection: Option<EventStream>,
    last_delivered: Option<Cursor>,
    failures: u32,
    server_retry_ms: Option<u64>,
    close_signal: Arc<watch::Sender<bool>>,
    close_requested: watch::Receiver<bool>,
    released: Arc<watch::Sender<bool>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> StreamSession<R> {
    /// Create an idle session for `descriptor`.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: Url,
        descriptor: RequestDescriptor,
        retry: RetryConfig,
    ) -> Self {
        let (close_signal, close_requested) = watch::channel(false);
        let (released, _) = watch::channel(false);
        Self {
            transport,
            base_url,
            descriptor,
            retry,
            state: StreamState::Idle,
            connection: None,
            last_delivered: None,
            failures: 0,
            server_retry_ms: None,
            close_signal: Arc::new(close_signal),
            close_requested,
            released: Arc::new(released),
            _record: PhantomData,
        }
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The resume point: the last delivered record's paging token, or the
    /// starting cursor before anything was delivered.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.last_delivered.as_ref().or(self.descriptor.cursor())
    }

    /// The request this session follows.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Consecutive failed connection attempts since the last delivered record.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// A handle that can close this session from another task.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            signal: self.close_signal.clone(),
            released: self.released.clone(),
        }
    }

    /// Open the first connection.
    ///
    /// Fails fast with [`Error::StreamAlreadyOpen`] if the session is
    /// already connecting or connected, and with [`Error::StreamClosed`]
    /// once it is closed.
    pub async fn open(&mut self) -> Result<(), Error> {
        match self.state {
            StreamState::Idle => {}
            StreamState::Closed => return Err(Error::StreamClosed),
            StreamState::Connecting | StreamState::Streaming | StreamState::Reconnecting => {
                return Err(Error::StreamAlreadyOpen);
            }
        }
        if self.close_requested() {
            self.close();
            return Err(Error::StreamClosed);
        }

        self.state = StreamState::Connecting;
        let mut close_requested = self.close_requested.clone();
        let outcome = race_close(&mut close_requested, self.establish()).await;
        match outcome {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(e),
            None => {
                self.close();
                Err(Error::StreamClosed)
            }
        }
    }

    /// Wait for the next record.
    ///
    /// Opens an idle session first. Returns `None` once the session is
    /// closed. An error is terminal: the session is closed when it is
    /// returned.
    pub async fn next_record(&mut self) -> Option<Result<R, Error>> {
        if self.close_requested() {
            self.close();
        }
        match self.state {
            StreamState::Closed => return None,
            StreamState::Idle => {
                if let Err(e) = self.open().await {
                    return match e {
                        Error::StreamClosed => None,
                        e => Some(Err(e)),
                    };
                }
            }
            StreamState::Connecting | StreamState::Streaming | StreamState::Reconnecting => {}
        }

        let mut close_requested = self.close_requested.clone();
        let outcome = race_close(&mut close_requested, self.advance()).await;
        match outcome {
            Some(item) => item,
            None => {
                self.close();
                None
            }
        }
    }

    /// Close the session and release its connection.
    ///
    /// Valid in every state; closing twice is a no-op.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            tracing::debug!(endpoint = self.descriptor.endpoint(), "event stream connection released");
        }
        self.state = StreamState::Closed;
        self.close_signal.send_replace(true);
        self.released.send_replace(true);
    }

    fn close_requested(&self) -> bool {
        *self.close_requested.borrow()
    }

    /// Connect, retrying within the budget.
    async fn establish(&mut self) -> Result<(), Error> {
        loop {
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) => self.on_failure(e).await?,
            }
        }
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        let url = self
            .descriptor
            .stream_url(&self.base_url, self.last_delivered.as_ref())?;
        tracing::debug!(
            %url,
            last_event_id = ?self.last_delivered.as_ref().map(Cursor::as_str),
            "opening event stream"
        );

        let connection = self
            .transport
            .stream(url, self.last_delivered.clone())
            .await?;
        self.connection = Some(connection);
        self.state = StreamState::Streaming;
        Ok(())
    }

    /// Read until a record is ready, reconnecting as needed.
    async fn advance(&mut self) -> Option<Result<R, Error>> {
        loop {
            if self.connection.is_none() {
                if let Err(e) = self.establish().await {
                    return Some(Err(e));
                }
            }
            let Some(connection) = self.connection.as_mut() else {
                continue;
            };

            let failure = match connection.next().await {
                Some(Ok(event)) => match self.accept(event) {
                    Ok(Some(record)) => return Some(Ok(record)),
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "undecodable event, closing stream");
                        self.close();
                        return Some(Err(e));
                    }
                },
                Some(Err(e)) => e,
                None => TransportError::disconnected("server closed the event stream"),
            };

            if let Err(e) = self.on_failure(failure).await {
                return Some(Err(e));
            }
        }
    }

    /// Turn one event into a record, or `None` for control frames and
    /// duplicates.
    fn accept(&mut self, event: SseEvent) -> Result<Option<R>, Error> {
        if let Some(retry_ms) = event.retry {
            self.server_retry_ms = Some(retry_ms);
        }
        if is_control_frame(&event) {
            return Ok(None);
        }

        let raw = match classify(&event.data)? {
            Envelope::Single(raw) => raw,
            Envelope::Collection { .. } => {
                return Err(DecodeError::malformed("event carries a collection, expected one record").into());
            }
        };
        let record = R::decode(raw)?;

        let token = record.paging_token();
        if let Some(last) = &self.last_delivered {
            if token <= last {
                tracing::debug!(cursor = %token, last = %last, "skipping duplicate record");
                return Ok(None);
            }
        }

        self.last_delivered = Some(token.clone());
        self.failures = 0;
        Ok(Some(record))
    }

    /// Record a failed connection or read. Sleeps before the next attempt,
    /// or closes the session and returns the terminal error.
    async fn on_failure(&mut self, error: TransportError) -> Result<(), Error> {
        self.connection = None;

        if !error.is_retryable() {
            tracing::error!(error = %error, "event stream failed");
            self.close();
            return Err(error.into());
        }

        self.failures += 1;
        if self.failures > self.retry.max_retries {
            let cursor = self.cursor().cloned();
            tracing::error!(
                attempts = self.failures,
                cursor = ?cursor.as_ref().map(Cursor::as_str),
                error = %error,
                "giving up on event stream"
            );
            self.close();
            return Err(Error::StreamInterrupted {
                attempts: self.failures,
                cursor,
                source: error,
            });
        }

        self.state = StreamState::Reconnecting;
        let initial = self.server_retry_ms.unwrap_or(self.retry.initial_delay_ms);
        let delay = backoff_delay(initial, self.retry.max_delay_ms, self.failures - 1);
        tracing::warn!(
            attempt = self.failures,
            max_retries = self.retry.max_retries,
            ?delay,
            error = %error,
            "event stream disconnected, reconnecting"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

impl<R> Drop for StreamSession<R> {
    fn drop(&mut self) {
        self.released.send_replace(true);
    }
}

/// Horizon greets new connections with `"hello"` and says `"byebye"` before
/// closing; neither is a record.
fn is_control_frame(event: &SseEvent) -> bool {
    let data = event.data.trim();
    data.is_empty()
        || event.event.as_deref() == Some("open")
        || matches!(data.trim_matches('"'), "hello" | "byebye")
}

/// Run `work` unless a close is requested first.
async fn race_close<T>(
    close_requested: &mut watch::Receiver<bool>,
    work: impl Future<Output = T>,
) -> Option<T> {
    let closed = pin!(close_requested.wait_for(|requested| *requested));
    let work = pin!(work);
    match future::select(work, closed).await {
        Either::Left((value, _)) => Some(value),
        Either::Right(_) => None,
    }
}

// ============================================================================
// RecordStream
// ============================================================================

type Step<R> = BoxFuture<'static, (StreamSession<R>, Option<Result<R, Error>>)>;

/// A [`StreamSession`] as a [`futures::Stream`].
///
/// # Example
///
/// ```rust,no_run
/// # use horizon_kit::*;
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Error> {
/// let horizon = Horizon::testnet().build()?;
/// let mut payments = horizon.payments().cursor("now").stream()?;
///
/// while let Some(payment) = payments.next().await {
///     let payment = payment?;
///     println!("{} {}", payment.kind(), payment.id());
/// }
/// # Ok(())
/// # }
/// ```
pub struct RecordStream<R> {
    session: Option<StreamSession<R>>,
    pending: Option<Step<R>>,
    handle: CloseHandle,
    cursor: Option<Cursor>,
}

impl<R: Record> RecordStream<R> {
    pub(crate) fn new(session: StreamSession<R>) -> Self {
        Self {
            handle: session.close_handle(),
            cursor: session.cursor().cloned(),
            session: Some(session),
            pending: None,
        }
    }

    /// The resume point as of the last yielded record.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Session state, or `None` while a read is in flight.
    pub fn state(&self) -> Option<StreamState> {
        self.session.as_ref().map(StreamSession::state)
    }

    /// A handle that can close this stream from another task.
    pub fn close_handle(&self) -> CloseHandle {
        self.handle.clone()
    }

    /// Close the stream. The connection is released before this returns.
    pub fn close(&mut self) {
        // Dropping an in-flight read drops the session it owns.
        self.pending = None;
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
        self.handle.close();
    }
}

impl<R: Record> Stream for RecordStream<R> {
    type Item = Result<R, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if this.pending.is_none() {
            let Some(mut session) = this.session.take() else {
                return Poll::Ready(None);
            };
            this.pending = Some(Box::pin(async move {
                let item = session.next_record().await;
                (session, item)
            }));
        }

        let Some(pending) = this.pending.as_mut() else {
            return Poll::Ready(None);
        };
        match pending.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready((session, item)) => {
                this.pending = None;
                this.cursor = session.cursor().cloned();
                this.session = Some(session);
                Poll::Ready(item)
            }
        }
    }
}
