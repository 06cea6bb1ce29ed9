//! Query builders for fluent read operations.
//!
//! A [`QueryBuilder`] accumulates a [`RequestDescriptor`] one setter at a
//! time. Setters never fail: an invalid argument is recorded against the
//! slot it targets (`"endpoint"` or the parameter name) and reported by
//! [`build`](QueryBuilder::build). A later valid call for the same slot
//! replaces the bad value and clears the error.
//!
//! Builders implement `IntoFuture`, so a configured query can be `.await`ed
//! directly, or turned into a live stream with
//! [`stream`](QueryBuilder::stream).

use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::types::{
    AccountRecord, Asset, AssetRecord, Cursor, EffectRecord, IntoPositiveId, LedgerRecord, Link,
    OperationRecord, Order, Page, Record, RequestDescriptor, Response, TradeAggregationRecord,
    TransactionRecord, classify, validate_account_id, validate_transaction_hash,
};

use super::horizon::ClientContext;
use super::stream::{RecordStream, StreamSession};

#[cfg(feature = "blocking")]
use super::blocking::{self, BlockingRecordStream};

/// Slot name for endpoint-selecting setters.
const ENDPOINT: &str = "endpoint";

/// Largest page Horizon serves.
pub const MAX_LIMIT: u32 = 200;

/// Bucket sizes Horizon aggregates trades into, in milliseconds: one
/// minute, five minutes, fifteen minutes, one hour, one day and one week.
pub const TRADE_RESOLUTIONS: [u64; 6] = [60_000, 300_000, 900_000, 3_600_000, 86_400_000, 604_800_000];

const HOUR_MS: u64 = 3_600_000;

/// Perform a single request/decode cycle.
pub(crate) async fn fetch<R: Record>(
    ctx: &ClientContext,
    descriptor: &RequestDescriptor,
) -> Result<Response<R>, Error> {
    let url = descriptor.to_url(&ctx.base_url)?;
    tracing::debug!(%url, kind = R::KIND, "GET");
    let body = ctx.transport.get(url).await?;
    Ok(classify(&body)?.decode()?)
}

// ============================================================================
// QueryBuilder
// ============================================================================

/// Fluent builder for requests returning records of type `R`.
///
/// # Example
///
/// ```rust,no_run
/// # use horizon_kit::*;
/// # async fn example() -> Result<(), Error> {
/// let horizon = Horizon::testnet().build()?;
///
/// let page = horizon
///     .transactions()
///     .for_ledger(100)
///     .include_failed(true)
///     .limit(50)
///     .order(Order::Desc)
///     .await?;
///
/// for tx in page.into_records() {
///     println!("{} ({} ops)", tx.hash, tx.operation_count);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<R> {
    ctx: Arc<ClientContext>,
    resource: &'static str,
    draft: RequestDescriptor,
    invalid: Vec<(String, String)>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            resource: self.resource,
            draft: self.draft.clone(),
            invalid: self.invalid.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for QueryBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("resource", &self.resource)
            .field("draft", &self.draft)
            .field("invalid", &self.invalid)
            .finish()
    }
}

impl<R: Record> QueryBuilder<R> {
    pub(crate) fn new(ctx: Arc<ClientContext>, resource: &'static str) -> Self {
        Self {
            ctx,
            resource,
            draft: RequestDescriptor::new(resource),
            invalid: Vec::new(),
            _record: PhantomData,
        }
    }

    /// The collection this builder targets, e.g. `"payments"`.
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    // ─── Shared setters ───

    /// Start after this paging token (`"now"` for streams that only want
    /// new records).
    pub fn cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        let cursor = cursor.into();
        if cursor.as_str().is_empty() {
            return self.reject("cursor", "must not be empty");
        }
        self.accept("cursor");
        self.draft.set_cursor(cursor);
        self
    }

    /// Page size, between 1 and 200.
    pub fn limit(mut self, limit: u32) -> Self {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return self.reject(
                "limit",
                format!("must be between 1 and {}, got {}", MAX_LIMIT, limit),
            );
        }
        self.accept("limit");
        self.draft.set_param("limit", limit.to_string());
        self
    }

    /// Sort order.
    pub fn order(mut self, order: Order) -> Self {
        self.accept("order");
        self.draft.set_param("order", order.as_str().to_string());
        self
    }

    /// Set an arbitrary query parameter.
    ///
    /// `cursor` is routed to [`cursor`](Self::cursor); anything else is
    /// passed through unvalidated.
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        let name = name.into();
        if name.is_empty() {
            return self.reject("param", "parameter name must not be empty");
        }
        if name == "cursor" {
            return self.cursor(value.to_string());
        }
        self.accept(&name);
        self.draft.set_param(&name, value.to_string());
        self
    }

    // ─── Pagination ───

    /// Reposition on the page after `page`.
    pub fn next_page(self, page: &Page<R>) -> Self {
        match page.links.next.as_ref().filter(|link| link.cursor().is_some()) {
            Some(link) => self.follow(link),
            None => match page.next_cursor() {
                Some(cursor) => self.cursor(cursor),
                None => self.reject("cursor", "page has no next cursor"),
            },
        }
    }

    /// Reposition on the page before `page`.
    pub fn prev_page(self, page: &Page<R>) -> Self {
        match page.links.prev.as_ref().filter(|link| link.cursor().is_some()) {
            Some(link) => self.follow(link),
            None => match page.prev_cursor() {
                Some(cursor) => {
                    let reversed = match self.draft.param("order") {
                        Some("desc") => Order::Asc,
                        _ => Order::Desc,
                    };
                    self.cursor(cursor).order(reversed)
                }
                None => self.reject("cursor", "page has no previous cursor"),
            },
        }
    }

    /// Apply the query parameters of a navigation link.
    pub fn follow(mut self, link: &Link) -> Self {
        for (name, value) in link.query_pairs() {
            self = self.param(name, value);
        }
        self
    }

    // ─── Terminal operations ───

    /// Validate and freeze the request.
    ///
    /// Pure and idempotent; no network activity.
    pub fn build(&self) -> Result<RequestDescriptor, Error> {
        match self.invalid.first() {
            Some((name, reason)) => Err(Error::invalid_argument(name.clone(), reason.clone())),
            None => Ok(self.draft.clone()),
        }
    }

    /// Create an idle stream session for this request.
    pub fn session(self) -> Result<StreamSession<R>, Error> {
        let descriptor = self.build()?;
        Ok(StreamSession::new(
            self.ctx.transport.clone(),
            self.ctx.base_url.clone(),
            descriptor,
            self.ctx.stream_retry.clone(),
        ))
    }

    /// Follow the request as a live stream.
    ///
    /// The connection opens on the first poll. Without a cursor the
    /// stream starts at `now`.
    pub fn stream(self) -> Result<RecordStream<R>, Error> {
        Ok(RecordStream::new(self.session()?))
    }

    /// Follow the request as a live stream, consumed from blocking code.
    #[cfg(feature = "blocking")]
    pub fn stream_blocking(self) -> Result<BlockingRecordStream<R>, Error> {
        BlockingRecordStream::new(self.session()?)
    }

    /// Run the request from blocking code.
    #[cfg(feature = "blocking")]
    pub fn call_blocking(self) -> Result<Response<R>, Error> {
        blocking::runtime()?.block_on(self.into_future())
    }

    // ─── Slot bookkeeping ───

    fn accept(&mut self, slot: &str) {
        self.invalid.retain(|(name, _)| name != slot);
    }

    fn reject(mut self, slot: &str, reason: impl fmt::Display) -> Self {
        self.accept(slot);
        self.invalid.push((slot.to_string(), reason.to_string()));
        self
    }

    fn endpoint(mut self, endpoint: String) -> Self {
        self.accept(ENDPOINT);
        self.draft.set_endpoint(endpoint);
        self
    }

    /// `{parent}/{id}/{resource}`, e.g. `ledgers/100/transactions`.
    fn nested(self, parent: &str, id: impl fmt::Display) -> Self {
        let endpoint = format!("{}/{}/{}", parent, id, self.resource);
        self.endpoint(endpoint)
    }

    fn nested_in_account(self, account_id: &str) -> Self {
        match validate_account_id(account_id) {
            Ok(()) => self.nested("accounts", account_id),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    fn nested_in_ledger(self, sequence: impl IntoPositiveId) -> Self {
        match ledger_sequence(sequence) {
            Ok(sequence) => self.nested("ledgers", sequence),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    fn nested_in_transaction(self, hash: &str) -> Self {
        match validate_transaction_hash(hash) {
            Ok(()) => self.nested("transactions", hash),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    fn nested_in_operation(self, id: impl IntoPositiveId) -> Self {
        match id.into_positive_id() {
            Ok(id) => self.nested("operations", id),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    fn account_param(mut self, name: &str, account_id: &str) -> Self {
        match validate_account_id(account_id) {
            Ok(()) => {
                self.accept(name);
                self.draft.set_param(name, account_id.to_string());
                self
            }
            Err(e) => self.reject(name, e),
        }
    }

    fn include_failed_param(mut self, include: bool) -> Self {
        self.accept("include_failed");
        self.draft.set_param("include_failed", include.to_string());
        self
    }
}

fn ledger_sequence(sequence: impl IntoPositiveId) -> Result<u32, String> {
    let sequence = sequence.into_positive_id().map_err(|e| e.to_string())?;
    u32::try_from(sequence).map_err(|_| format!("ledger sequence {} is out of range", sequence))
}

impl<R: Record> IntoFuture for QueryBuilder<R> {
    type Output = Result<Response<R>, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let descriptor = self.build()?;
            fetch(&self.ctx, &descriptor).await
        })
    }
}

// ============================================================================
// Accounts
// ============================================================================

impl QueryBuilder<AccountRecord> {
    /// A single account.
    pub fn account(self, account_id: impl AsRef<str>) -> Self {
        let account_id = account_id.as_ref();
        match validate_account_id(account_id) {
            Ok(()) => self.endpoint(format!("accounts/{}", account_id)),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    /// Accounts that have `signer` as a signer.
    pub fn for_signer(self, signer: impl AsRef<str>) -> Self {
        self.account_param("signer", signer.as_ref())
    }

    /// Accounts holding a trustline to `asset`.
    pub fn for_asset(mut self, asset: &Asset) -> Self {
        if asset.is_native() {
            return self.reject("asset", "the native asset has no trustlines");
        }
        self.accept("asset");
        self.draft.set_param("asset", asset.to_string());
        self
    }

    /// Accounts sponsored by `sponsor`.
    pub fn for_sponsor(self, sponsor: impl AsRef<str>) -> Self {
        self.account_param("sponsor", sponsor.as_ref())
    }
}

// ============================================================================
// Assets
// ============================================================================

impl QueryBuilder<AssetRecord> {
    /// Assets with this code.
    pub fn for_code(mut self, code: impl AsRef<str>) -> Self {
        let code = code.as_ref();
        if !(1..=12).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return self.reject(
                "asset_code",
                format!("expected 1-12 alphanumeric characters, got {:?}", code),
            );
        }
        self.accept("asset_code");
        self.draft.set_param("asset_code", code.to_string());
        self
    }

    /// Assets issued by this account.
    pub fn for_issuer(self, issuer: impl AsRef<str>) -> Self {
        self.account_param("asset_issuer", issuer.as_ref())
    }
}

// ============================================================================
// Effects
// ============================================================================

impl QueryBuilder<EffectRecord> {
    /// Effects on an account.
    pub fn for_account(self, account_id: impl AsRef<str>) -> Self {
        self.nested_in_account(account_id.as_ref())
    }

    /// Effects in a ledger.
    pub fn for_ledger(self, sequence: impl IntoPositiveId) -> Self {
        self.nested_in_ledger(sequence)
    }

    /// Effects of a transaction.
    pub fn for_transaction(self, hash: impl AsRef<str>) -> Self {
        self.nested_in_transaction(hash.as_ref())
    }

    /// Effects of an operation.
    pub fn for_operation(self, operation_id: impl IntoPositiveId) -> Self {
        self.nested_in_operation(operation_id)
    }
}

// ============================================================================
// Ledgers
// ============================================================================

impl QueryBuilder<LedgerRecord> {
    /// A single ledger.
    pub fn ledger(self, sequence: impl IntoPositiveId) -> Self {
        match ledger_sequence(sequence) {
            Ok(sequence) => self.endpoint(format!("ledgers/{}", sequence)),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }
}

// ============================================================================
// Operations and payments
// ============================================================================

/// Serves both `operations()` and `payments()`; the nested endpoints follow
/// [`resource`](QueryBuilder::resource).
impl QueryBuilder<OperationRecord> {
    /// A single operation. Always targets `operations/{id}`.
    pub fn operation(self, operation_id: impl IntoPositiveId) -> Self {
        match operation_id.into_positive_id() {
            Ok(id) => self.endpoint(format!("operations/{}", id)),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    /// Operations involving an account.
    pub fn for_account(self, account_id: impl AsRef<str>) -> Self {
        self.nested_in_account(account_id.as_ref())
    }

    /// Operations in a ledger.
    pub fn for_ledger(self, sequence: impl IntoPositiveId) -> Self {
        self.nested_in_ledger(sequence)
    }

    /// Operations in a transaction.
    pub fn for_transaction(self, hash: impl AsRef<str>) -> Self {
        self.nested_in_transaction(hash.as_ref())
    }

    /// Include operations of failed transactions.
    pub fn include_failed(self, include: bool) -> Self {
        self.include_failed_param(include)
    }

    /// Embed related resources. Only `"transactions"` is supported.
    pub fn join(mut self, join: impl AsRef<str>) -> Self {
        let join = join.as_ref();
        if join != "transactions" {
            return self.reject("join", format!("only \"transactions\" is supported, got {:?}", join));
        }
        self.accept("join");
        self.draft.set_param("join", join.to_string());
        self
    }
}

// ============================================================================
// Transactions
// ============================================================================

impl QueryBuilder<TransactionRecord> {
    /// A single transaction.
    pub fn transaction(self, hash: impl AsRef<str>) -> Self {
        let hash = hash.as_ref();
        match validate_transaction_hash(hash) {
            Ok(()) => self.endpoint(format!("transactions/{}", hash)),
            Err(e) => self.reject(ENDPOINT, e),
        }
    }

    /// Transactions involving an account.
    pub fn for_account(self, account_id: impl AsRef<str>) -> Self {
        self.nested_in_account(account_id.as_ref())
    }

    /// Transactions in a ledger.
    pub fn for_ledger(self, sequence: impl IntoPositiveId) -> Self {
        self.nested_in_ledger(sequence)
    }

    /// Include failed transactions.
    pub fn include_failed(self, include: bool) -> Self {
        self.include_failed_param(include)
    }
}

// ============================================================================
// Trade aggregations
// ============================================================================

/// `base_asset`, `counter_asset` and `resolution` are required; the builder
/// starts with all three outstanding.
impl QueryBuilder<TradeAggregationRecord> {
    pub(crate) fn trade_aggregations(ctx: Arc<ClientContext>) -> Self {
        Self::new(ctx, "trade_aggregations")
            .reject("base_asset", "is required")
            .reject("counter_asset", "is required")
            .reject("resolution", "is required")
    }

    /// The asset prices are quoted for.
    pub fn base_asset(self, asset: &Asset) -> Self {
        self.asset_params("base_asset", asset)
    }

    /// The asset prices are quoted in.
    pub fn counter_asset(self, asset: &Asset) -> Self {
        self.asset_params("counter_asset", asset)
    }

    /// Bucket size in milliseconds; one of [`TRADE_RESOLUTIONS`].
    pub fn resolution(mut self, resolution_ms: u64) -> Self {
        if !TRADE_RESOLUTIONS.contains(&resolution_ms) {
            return self.reject(
                "resolution",
                format!("must be one of {:?}, got {}", TRADE_RESOLUTIONS, resolution_ms),
            );
        }
        self.accept("resolution");
        self.draft.set_param("resolution", resolution_ms.to_string());
        self
    }

    /// Lower time bound, in milliseconds since the epoch.
    pub fn start_time(mut self, start_ms: u64) -> Self {
        self.accept("start_time");
        self.draft.set_param("start_time", start_ms.to_string());
        self
    }

    /// Upper time bound, in milliseconds since the epoch.
    pub fn end_time(mut self, end_ms: u64) -> Self {
        self.accept("end_time");
        self.draft.set_param("end_time", end_ms.to_string());
        self
    }

    /// Shift bucket boundaries by whole hours, up to one day.
    ///
    /// Horizon also requires the offset to be smaller than the resolution.
    pub fn offset(mut self, offset_ms: u64) -> Self {
        if offset_ms % HOUR_MS != 0 || offset_ms > 24 * HOUR_MS {
            return self.reject(
                "offset",
                format!("must be a whole number of hours up to 24, got {}ms", offset_ms),
            );
        }
        self.accept("offset");
        self.draft.set_param("offset", offset_ms.to_string());
        self
    }

    /// `{slot}_type`, plus `{slot}_code` and `{slot}_issuer` for credit assets.
    fn asset_params(mut self, slot: &str, asset: &Asset) -> Self {
        let type_param = format!("{}_type", slot);
        let code_param = format!("{}_code", slot);
        let issuer_param = format!("{}_issuer", slot);

        if asset.is_native() {
            self.accept(slot);
            self.draft.set_param(&type_param, asset.asset_type.clone());
            self.draft.remove_param(&code_param);
            self.draft.remove_param(&issuer_param);
            return self;
        }

        let (Some(code), Some(issuer)) = (&asset.asset_code, &asset.asset_issuer) else {
            return self.reject(slot, "credit assets need a code and an issuer");
        };
        if let Err(e) = validate_account_id(issuer) {
            return self.reject(slot, e);
        }
        self.accept(slot);
        self.draft.set_param(&type_param, asset.asset_type.clone());
        self.draft.set_param(&code_param, code.clone());
        self.draft.set_param(&issuer_param, issuer.clone());
        self
    }
}
