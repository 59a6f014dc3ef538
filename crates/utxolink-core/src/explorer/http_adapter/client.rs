use std::time::Duration;

use async_trait::async_trait;
use bitcoin::Txid;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, ExplorerError};

use super::super::types::{AddressUtxo, Outspend, Transaction};
use super::super::Explorer;
use super::connection::parse_base_url;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Esplora REST client over HTTP(S).
///
/// Requests are issued one at a time by the caller and paced by a
/// single-slot limiter: a request may start only once `min_interval` has
/// passed since the previous request started. There is no burst allowance.
pub struct EsploraClient {
    client: reqwest::Client,
    base_url: String,
    limiter: Option<DirectRateLimiter>,
}

impl EsploraClient {
    /// Create a client for `base_url` (for example
    /// `https://blockstream.info/liquid/api`).
    ///
    /// A zero `min_interval` disables pacing. `timeout` bounds each request
    /// end to end; exceeding it is reported as a transport failure.
    pub fn new(
        base_url: &str,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let base_url = parse_base_url(base_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .user_agent(concat!("utxolink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build http client: {e}")))?;

        // `with_period` yields a quota of one cell per period with a burst
        // of one, and `None` for a zero period.
        let limiter = Quota::with_period(min_interval).map(RateLimiter::direct);

        Ok(Self {
            client,
            base_url,
            limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Paced GET of `{base_url}{path}` decoded as `T`. Failures are logged
    /// here, once, with the URL and the status or reason.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        self.wait_for_rate_limit().await;
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "explorer request");

        let result = self.fetch(url).await;
        if let Err(err) = &result {
            warn!(url = err.url(), error = %err, "explorer request failed");
        }
        result.map_err(CoreError::from)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String) -> Result<T, ExplorerError> {
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(source) => return Err(ExplorerError::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::Status { url, status });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => return Err(ExplorerError::Transport { url, source }),
        };
        debug!(%url, %status, body_len = body.len(), "explorer response");
        trace!(%url, body = %body, "explorer response body");

        serde_json::from_str(&body).map_err(|e| ExplorerError::InvalidResponse {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Explorer for EsploraClient {
    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError> {
        self.get_json(&format!("/tx/{txid}")).await
    }

    async fn get_outspend(&self, txid: &Txid, vout: u32) -> Result<Outspend, CoreError> {
        self.get_json(&format!("/tx/{txid}/outspend/{vout}")).await
    }

    async fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, CoreError> {
        self.get_json(&format!("/address/{address}/utxo")).await
    }
}
