//! Blocking adapters.
//!
//! These drive the async machinery on a private current-thread runtime.
//! They must not be used from inside an async context: blocking on a
//! runtime from within another runtime panics.

use futures::StreamExt;
use tokio::runtime::{Builder, Runtime};

use super::stream::{CloseHandle, RecordStream, StreamSession, StreamState};
use crate::error::Error;
use crate::types::{Cursor, Record};

pub(crate) fn runtime() -> Result<Runtime, Error> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// A live record feed consumed as a blocking iterator.
///
/// Each call to `next` suspends the calling thread until a record arrives,
/// the session gives up, or it is closed.
///
/// # Example
///
/// ```rust,no_run
/// # use horizon_kit::*;
/// # fn example() -> Result<(), Error> {
/// let horizon = Horizon::testnet().build()?;
/// let ledgers = horizon.ledgers().cursor("now").stream_blocking()?;
///
/// for ledger in ledgers.take(3) {
///     println!("closed ledger {}", ledger?.sequence);
/// }
/// # Ok(())
/// # }
/// ```
pub struct BlockingRecordStream<R> {
    // Declared first so the connection is released before the runtime goes.
    stream: RecordStream<R>,
    runtime: Runtime,
}

impl<R: Record> BlockingRecordStream<R> {
    pub(crate) fn new(session: StreamSession<R>) -> Result<Self, Error> {
        Ok(Self {
            stream: RecordStream::new(session),
            runtime: runtime()?,
        })
    }

    /// The resume point as of the last yielded record.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.stream.cursor()
    }

    /// Session state.
    pub fn state(&self) -> Option<StreamState> {
        self.stream.state()
    }

    /// A handle that can close this stream from another thread.
    pub fn close_handle(&self) -> CloseHandle {
        self.stream.close_handle()
    }

    /// Close the stream and release its connection.
    pub fn close(&mut self) {
        self.stream.close();
    }
}

impl<R: Record> Iterator for BlockingRecordStream<R> {
    type Item = Result<R, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
