//! Shared test helpers for `utxolink-core` unit tests.
//!
//! Builders for explorer records (`make_tx`, `make_tx_spending`,
//! `address_utxo`) so that tests across modules share one source of truth
//! for dummy data construction.

use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, Txid};

use crate::explorer::{AddressUtxo, Transaction, TxIn, TxOut, TxStatus};

// ==============================================================================
// Txid Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
/// Useful for building small test graphs where txids only need to be unique.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

pub fn confirmed_status() -> TxStatus {
    TxStatus {
        confirmed: true,
        block_height: Some(100),
        block_hash: None,
        block_time: Some(1_700_000_000),
    }
}

// ==============================================================================
// Transaction Builders
// ==============================================================================

/// A confirmed transaction with no inputs and `outputs` explicit-value outputs.
pub fn make_tx(txid: Txid, outputs: usize) -> Transaction {
    make_tx_spending(txid, &[], outputs)
}

/// A confirmed transaction spending `inputs` and creating `outputs` outputs.
pub fn make_tx_spending(txid: Txid, inputs: &[OutPoint], outputs: usize) -> Transaction {
    Transaction {
        txid,
        vin: inputs
            .iter()
            .map(|prevout| TxIn {
                txid: Some(prevout.txid),
                vout: Some(prevout.vout),
                is_coinbase: false,
                is_pegin: false,
            })
            .collect(),
        vout: (0..outputs)
            .map(|_| TxOut {
                value: Some(1_000),
                ..TxOut::default()
            })
            .collect(),
        status: confirmed_status(),
    }
}

pub fn address_utxo(txid: Txid, vout: u32, value: Option<u64>) -> AddressUtxo {
    AddressUtxo {
        txid,
        vout,
        value,
        asset: None,
        status: confirmed_status(),
    }
}
