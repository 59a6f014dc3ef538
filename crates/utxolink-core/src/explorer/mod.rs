//! Block-explorer abstraction layer.
//!
//! Defines the [`Explorer`] trait and provides an Esplora REST
//! implementation ([`EsploraClient`]) plus a test mock (`mock::MockExplorer`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::EsploraClient;
pub use types::{AddressUtxo, Outspend, Transaction, TxIn, TxOut, TxStatus};

use async_trait::async_trait;
use bitcoin::Txid;

use crate::error::CoreError;

/// The read-only explorer queries utxolink needs.
///
/// Every call is an idempotent read. A failed call returns an error for that
/// call only; implementations must not panic on bad responses.
#[async_trait]
pub trait Explorer: Send + Sync {
    /// Fetch a transaction with its inputs and ordered outputs.
    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError>;

    /// Fetch whether `txid:vout` has been spent and, if so, by which
    /// transaction and input.
    async fn get_outspend(&self, txid: &Txid, vout: u32) -> Result<Outspend, CoreError>;

    /// List the unspent outputs currently paying to `address`.
    async fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, CoreError>;
}
