//! Esplora response records.
//!
//! Only the fields the search and snapshot code read are modelled. Ids and
//! the output list are required; everything else falls back to a default so
//! that a partially-populated response still decodes.

use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Confirmation Status
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    #[serde(default)]
    pub confirmed: bool,
    pub block_height: Option<u32>,
    pub block_hash: Option<String>,
    pub block_time: Option<u64>,
}

// ==============================================================================
// Transactions
// ==============================================================================

/// A transaction as returned by `GET /tx/{txid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: Txid,
    #[serde(default)]
    pub vin: Vec<TxIn>,
    /// Output order is significant: the position is the output index.
    pub vout: Vec<TxOut>,
    #[serde(default)]
    pub status: TxStatus,
}

impl Transaction {
    pub fn output_count(&self) -> usize {
        self.vout.len()
    }

    /// Prevouts of every input that spends a Liquid output. Coinbase and
    /// peg-in inputs reference nothing on the Liquid chain and are skipped.
    pub fn funding_outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.vin.iter().filter_map(TxIn::prevout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub txid: Option<Txid>,
    pub vout: Option<u32>,
    #[serde(default)]
    pub is_coinbase: bool,
    #[serde(default)]
    pub is_pegin: bool,
}

impl TxIn {
    pub fn prevout(&self) -> Option<OutPoint> {
        if self.is_coinbase || self.is_pegin {
            return None;
        }
        Some(OutPoint::new(self.txid?, self.vout?))
    }
}

/// A transaction output. Confidential outputs carry commitments instead of
/// `value`/`asset`, so both are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub scriptpubkey: Option<String>,
    pub scriptpubkey_type: Option<String>,
    pub scriptpubkey_address: Option<String>,
    pub value: Option<u64>,
    pub asset: Option<String>,
}

// ==============================================================================
// Spend Status
// ==============================================================================

/// Spend status of one output, from `GET /tx/{txid}/outspend/{vout}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outspend {
    #[serde(default)]
    pub spent: bool,
    pub txid: Option<Txid>,
    pub vin: Option<u32>,
    pub status: Option<TxStatus>,
}

impl Outspend {
    pub fn unspent() -> Self {
        Self::default()
    }

    /// The spending transaction, if the output is spent and the explorer
    /// named the spender.
    pub fn spender(&self) -> Option<Txid> {
        if self.spent {
            self.txid
        } else {
            None
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.confirmed)
    }
}

// ==============================================================================
// Address UTXOs
// ==============================================================================

/// One entry of `GET /address/{address}/utxo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressUtxo {
    pub txid: Txid,
    pub vout: u32,
    pub value: Option<u64>,
    pub asset: Option<String>,
    #[serde(default)]
    pub status: TxStatus,
}

impl AddressUtxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}
