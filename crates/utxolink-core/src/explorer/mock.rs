use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::{OutPoint, Txid};
use reqwest::StatusCode;

use crate::error::{CoreError, ExplorerError};

use super::types::{AddressUtxo, Outspend, Transaction, TxStatus};
use super::Explorer;

/// One call received by [`MockExplorer`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Transaction(Txid),
    Outspend(OutPoint),
    AddressUtxos(String),
}

/// A mock explorer backend for testing. Serves canned transactions and
/// spend statuses populated via the builder pattern and records every call.
///
/// Unknown transactions answer 404; unknown outpoints answer "unspent",
/// matching Esplora.
pub struct MockExplorer {
    transactions: HashMap<Txid, Transaction>,
    outspends: HashMap<OutPoint, Outspend>,
    failing_outspends: HashSet<OutPoint>,
    failing_transactions: HashSet<Txid>,
    address_utxos: HashMap<String, Vec<AddressUtxo>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockExplorer {
    pub fn builder() -> MockExplorerBuilder {
        MockExplorerBuilder {
            transactions: HashMap::new(),
            outspends: HashMap::new(),
            failing_outspends: HashSet::new(),
            failing_transactions: HashSet::new(),
            address_utxos: HashMap::new(),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn outspend_calls(&self, outpoint: &OutPoint) -> usize {
        self.count(&MockCall::Outspend(*outpoint))
    }

    pub fn transaction_calls(&self, txid: &Txid) -> usize {
        self.count(&MockCall::Transaction(*txid))
    }

    fn count(&self, call: &MockCall) -> usize {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().expect("mock call log poisoned").push(call);
    }
}

fn unavailable(url: String) -> CoreError {
    ExplorerError::Status {
        url,
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
    .into()
}

pub struct MockExplorerBuilder {
    transactions: HashMap<Txid, Transaction>,
    outspends: HashMap<OutPoint, Outspend>,
    failing_outspends: HashSet<OutPoint>,
    failing_transactions: HashSet<Txid>,
    address_utxos: HashMap<String, Vec<AddressUtxo>>,
}

impl MockExplorerBuilder {
    pub fn with_tx(mut self, tx: Transaction) -> Self {
        self.transactions.insert(tx.txid, tx);
        self
    }

    /// Mark `outpoint` as spent by input `vin` of `spender`, confirmed.
    pub fn with_spend(self, outpoint: OutPoint, spender: Txid, vin: u32) -> Self {
        self.with_outspend(
            outpoint,
            Outspend {
                spent: true,
                txid: Some(spender),
                vin: Some(vin),
                status: Some(TxStatus {
                    confirmed: true,
                    block_height: Some(200),
                    block_hash: None,
                    block_time: Some(1_700_000_600),
                }),
            },
        )
    }

    /// Mark `outpoint` as spent by a transaction still in the mempool.
    pub fn with_unconfirmed_spend(self, outpoint: OutPoint, spender: Txid, vin: u32) -> Self {
        self.with_outspend(
            outpoint,
            Outspend {
                spent: true,
                txid: Some(spender),
                vin: Some(vin),
                status: Some(TxStatus::default()),
            },
        )
    }

    pub fn with_outspend(mut self, outpoint: OutPoint, outspend: Outspend) -> Self {
        self.outspends.insert(outpoint, outspend);
        self
    }

    pub fn failing_outspend(mut self, outpoint: OutPoint) -> Self {
        self.failing_outspends.insert(outpoint);
        self
    }

    pub fn failing_tx(mut self, txid: Txid) -> Self {
        self.failing_transactions.insert(txid);
        self
    }

    pub fn with_address_utxos(mut self, address: &str, utxos: Vec<AddressUtxo>) -> Self {
        self.address_utxos.insert(address.to_owned(), utxos);
        self
    }

    pub fn build(self) -> MockExplorer {
        MockExplorer {
            transactions: self.transactions,
            outspends: self.outspends,
            failing_outspends: self.failing_outspends,
            failing_transactions: self.failing_transactions,
            address_utxos: self.address_utxos,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Explorer for MockExplorer {
    async fn get_transaction(&self, txid: &Txid) -> Result<Transaction, CoreError> {
        self.record(MockCall::Transaction(*txid));
        if self.failing_transactions.contains(txid) {
            return Err(unavailable(format!("mock:///tx/{txid}")));
        }
        self.transactions.get(txid).cloned().ok_or_else(|| {
            ExplorerError::Status {
                url: format!("mock:///tx/{txid}"),
                status: StatusCode::NOT_FOUND,
            }
            .into()
        })
    }

    async fn get_outspend(&self, txid: &Txid, vout: u32) -> Result<Outspend, CoreError> {
        let outpoint = OutPoint::new(*txid, vout);
        self.record(MockCall::Outspend(outpoint));
        if self.failing_outspends.contains(&outpoint) {
            return Err(unavailable(format!("mock:///tx/{txid}/outspend/{vout}")));
        }
        Ok(self
            .outspends
            .get(&outpoint)
            .cloned()
            .unwrap_or_else(Outspend::unspent))
    }

    async fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, CoreError> {
        self.record(MockCall::AddressUtxos(address.to_owned()));
        self.address_utxos
            .get(address)
            .cloned()
            .ok_or_else(|| unavailable(format!("mock:///address/{address}/utxo")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn unknown_outpoint_is_unspent_and_unknown_tx_is_not_found() {
        let explorer = MockExplorer::builder().build();
        let txid = txid_from_byte(9);

        let outspend = explorer.get_outspend(&txid, 0).await.expect("must answer");
        assert!(!outspend.spent);

        let err = explorer
            .get_transaction(&txid)
            .await
            .expect_err("unknown tx must fail");
        assert!(matches!(err, CoreError::Explorer(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn records_calls_in_order() {
        let txid = txid_from_byte(1);
        let explorer = MockExplorer::builder()
            .with_tx(make_tx(txid, 1))
            .failing_outspend(OutPoint::new(txid, 0))
            .build();

        let _ = explorer.get_outspend(&txid, 0).await;
        let _ = explorer.get_transaction(&txid).await;

        assert_eq!(
            explorer.calls(),
            vec![
                MockCall::Outspend(OutPoint::new(txid, 0)),
                MockCall::Transaction(txid),
            ]
        );
        assert_eq!(explorer.outspend_calls(&OutPoint::new(txid, 0)), 1);
    }
}
