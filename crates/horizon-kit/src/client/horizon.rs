//! The main Horizon client.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Url;

use crate::error::Error;
use crate::types::{
    AccountRecord, AssetRecord, EffectRecord, Envelope, FeeStats, LedgerRecord, Network,
    OperationRecord, RequestDescriptor, TradeAggregationRecord, TransactionRecord, classify,
};

use super::query::QueryBuilder;
use super::transport::{FUTURENET, HttpTransport, PUBLIC, RetryConfig, TESTNET, Transport};

/// Shared state behind a [`Horizon`] client and its builders.
pub(crate) struct ClientContext {
    pub(crate) base_url: Url,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) stream_retry: RetryConfig,
}

/// The main client for reading from a Horizon server.
///
/// Every collection has an entry point returning a [`QueryBuilder`];
/// configure it, then `.await` it for one page, or call `stream()` to
/// follow it live.
///
/// # Example
///
/// ```rust,no_run
/// use horizon_kit::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), horizon_kit::Error> {
///     let horizon = Horizon::testnet().build()?;
///
///     let ledger = horizon.ledgers().ledger(100).await?;
///     if let Some(ledger) = ledger.single() {
///         println!("ledger 100 closed at {}", ledger.closed_at);
///     }
///
///     let stats = horizon.fee_stats().await?;
///     println!("median fee: {}", stats.fee_charged.p50);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Horizon {
    ctx: Arc<ClientContext>,
    network: Network,
}

impl Horizon {
    /// Create a builder for the public network.
    pub fn public() -> HorizonBuilder {
        HorizonBuilder::new(PUBLIC.horizon_url, PUBLIC.network)
    }

    /// Create a builder for testnet.
    pub fn testnet() -> HorizonBuilder {
        HorizonBuilder::new(TESTNET.horizon_url, TESTNET.network)
    }

    /// Create a builder for futurenet.
    pub fn futurenet() -> HorizonBuilder {
        HorizonBuilder::new(FUTURENET.horizon_url, FUTURENET.network)
    }

    /// Create a builder with a custom Horizon URL.
    pub fn custom(horizon_url: impl Into<String>) -> HorizonBuilder {
        HorizonBuilder::new(horizon_url, Network::Custom)
    }

    /// Create a client from the environment.
    ///
    /// Reads `HORIZON_NETWORK`: `"public"`, `"testnet"`, `"futurenet"` or a
    /// custom Horizon URL. Defaults to testnet when unset.
    ///
    /// ```bash
    /// export HORIZON_NETWORK=https://horizon.example.com
    /// ```
    pub fn from_env() -> Result<Horizon, Error> {
        let network = std::env::var("HORIZON_NETWORK").ok();
        Self::for_network_name(network.as_deref()).build()
    }

    fn for_network_name(name: Option<&str>) -> HorizonBuilder {
        match name {
            Some("public") | Some("mainnet") => Horizon::public(),
            Some("testnet") | None => Horizon::testnet(),
            Some("futurenet") => Horizon::futurenet(),
            Some(url) => Horizon::custom(url),
        }
    }

    /// The Horizon base URL.
    pub fn horizon_url(&self) -> &Url {
        &self.ctx.base_url
    }

    /// The network this client talks to.
    pub fn network(&self) -> Network {
        self.network
    }

    // ─── Collections ───

    /// Accounts.
    pub fn accounts(&self) -> QueryBuilder<AccountRecord> {
        QueryBuilder::new(self.ctx.clone(), "accounts")
    }

    /// Issued assets.
    pub fn assets(&self) -> QueryBuilder<AssetRecord> {
        QueryBuilder::new(self.ctx.clone(), "assets")
    }

    /// Effects.
    pub fn effects(&self) -> QueryBuilder<EffectRecord> {
        QueryBuilder::new(self.ctx.clone(), "effects")
    }

    /// Ledgers.
    pub fn ledgers(&self) -> QueryBuilder<LedgerRecord> {
        QueryBuilder::new(self.ctx.clone(), "ledgers")
    }

    /// Operations of every kind.
    pub fn operations(&self) -> QueryBuilder<OperationRecord> {
        QueryBuilder::new(self.ctx.clone(), "operations")
    }

    /// Payment-like operations: create account, payments, path payments and
    /// account merges.
    pub fn payments(&self) -> QueryBuilder<OperationRecord> {
        QueryBuilder::new(self.ctx.clone(), "payments")
    }

    /// Transactions.
    pub fn transactions(&self) -> QueryBuilder<TransactionRecord> {
        QueryBuilder::new(self.ctx.clone(), "transactions")
    }

    /// Trade statistics for an asset pair, bucketed by time.
    ///
    /// Set [`base_asset`](QueryBuilder::base_asset),
    /// [`counter_asset`](QueryBuilder::counter_asset) and
    /// [`resolution`](QueryBuilder::resolution) before sending.
    pub fn trade_aggregations(&self) -> QueryBuilder<TradeAggregationRecord> {
        QueryBuilder::trade_aggregations(self.ctx.clone())
    }

    /// Current fee statistics.
    pub fn fee_stats(&self) -> FeeStatsQuery {
        FeeStatsQuery {
            ctx: self.ctx.clone(),
        }
    }
}

// ============================================================================
// FeeStatsQuery
// ============================================================================

/// Query for `/fee_stats`.
pub struct FeeStatsQuery {
    ctx: Arc<ClientContext>,
}

impl IntoFuture for FeeStatsQuery {
    type Output = Result<FeeStats, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let url = RequestDescriptor::new("fee_stats").to_url(&self.ctx.base_url)?;
            tracing::debug!(%url, "GET");
            let body = self.ctx.transport.get(url).await?;
            match classify(&body)? {
                Envelope::Single(raw) => Ok(FeeStats::decode(raw)?),
                Envelope::Collection { .. } => Err(crate::error::DecodeError::malformed(
                    "fee stats answered with a collection",
                )
                .into()),
            }
        })
    }
}

// ============================================================================
// HorizonBuilder
// ============================================================================

/// Builder for creating a [`Horizon`] client.
///
/// # Example
///
/// ```rust,no_run
/// use horizon_kit::*;
///
/// # fn example() -> Result<(), Error> {
/// let horizon = Horizon::public()
///     .client_name("my-wallet", "2.1.0")
///     .retry_config(RetryConfig {
///         max_retries: 5,
///         initial_delay_ms: 250,
///         max_delay_ms: 4000,
///     })
///     .stream_retry_config(RetryConfig::streaming())
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HorizonBuilder {
    horizon_url: String,
    network: Network,
    transport: Option<Arc<dyn Transport>>,
    retry_config: RetryConfig,
    stream_retry_config: RetryConfig,
    client_name: Option<(String, String)>,
}

impl HorizonBuilder {
    fn new(horizon_url: impl Into<String>, network: Network) -> Self {
        Self {
            horizon_url: horizon_url.into(),
            network,
            transport: None,
            retry_config: RetryConfig::default(),
            stream_retry_config: RetryConfig::streaming(),
            client_name: None,
        }
    }

    /// Use a custom transport instead of the built-in HTTP one.
    ///
    /// The transport handles its own retries; [`retry_config`](Self::retry_config)
    /// and [`client_name`](Self::client_name) only configure the built-in one.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the retry configuration for single requests.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set the reconnect budget for live streams.
    pub fn stream_retry_config(mut self, config: RetryConfig) -> Self {
        self.stream_retry_config = config;
        self
    }

    /// Identify the application to the server.
    pub fn client_name(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = Some((name.into(), version.into()));
        self
    }

    /// Build the client.
    ///
    /// Fails if the Horizon URL is not an absolute `http(s)` URL.
    pub fn build(self) -> Result<Horizon, Error> {
        let base_url = Url::parse(&self.horizon_url)
            .map_err(|e| Error::Config(format!("invalid Horizon URL {:?}: {}", self.horizon_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Horizon URL must be http or https, got {:?}",
                self.horizon_url
            )));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut http = HttpTransport::with_retry_config(self.retry_config);
                if let Some((name, version)) = self.client_name {
                    http = http.with_client_name(name, version);
                }
                Arc::new(http)
            }
        };

        Ok(Horizon {
            ctx: Arc::new(ClientContext {
                base_url,
                transport,
                stream_retry: self.stream_retry_config,
            }),
            network: self.network,
        })
    }
}

impl TryFrom<HorizonBuilder> for Horizon {
    type Error = Error;

    fn try_from(builder: HorizonBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
