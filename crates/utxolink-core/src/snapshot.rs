//! Wallet UTXO snapshots.
//!
//! A snapshot records a wallet's outputs, both unspent and spent, so that two
//! snapshots can later be cross-referenced by the spend search. Snapshots are
//! collected from an explorer by address and refreshed with spend status.

use std::collections::HashSet;

use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::explorer::{AddressUtxo, Explorer};
use crate::outpoint;

/// Schema identifier stamped into every snapshot this crate writes.
pub const SNAPSHOT_SCHEMA: &str = "utxo-snapshot-v2";

// ==============================================================================
// Network
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidNetwork {
    #[default]
    #[serde(rename = "liquidv1", alias = "liquid")]
    Liquid,
    #[serde(rename = "liquidtestnet", alias = "testnet")]
    LiquidTestnet,
}

impl LiquidNetwork {
    /// Blockstream's public Esplora instance for this network.
    pub fn default_esplora_url(self) -> &'static str {
        match self {
            Self::Liquid => "https://blockstream.info/liquid/api",
            Self::LiquidTestnet => "https://blockstream.info/liquidtestnet/api",
        }
    }
}

impl std::fmt::Display for LiquidNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Liquid => write!(f, "liquidv1"),
            Self::LiquidTestnet => write!(f, "liquidtestnet"),
        }
    }
}

impl std::str::FromStr for LiquidNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liquidv1" | "liquid" => Ok(Self::Liquid),
            "liquidtestnet" | "testnet" => Ok(Self::LiquidTestnet),
            other => Err(format!(
                "unknown network `{other}`; expected liquidv1 or liquidtestnet"
            )),
        }
    }
}

// ==============================================================================
// Records
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtxoStatus {
    #[default]
    Unspent,
    Spent,
}

/// One wallet output. Fields this crate does not know are kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoRecord {
    /// `"<txid>:<vout>"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub status: UtxoStatus,
    #[serde(deserialize_with = "outpoint::deserialize_txid")]
    pub txid: Txid,
    #[serde(deserialize_with = "outpoint::deserialize_vout")]
    pub vout: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// `None` for confidential outputs whose value the explorer cannot see.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_sat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_txid: Option<Txid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_vin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_block_time: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UtxoRecord {
    pub fn unspent(outpoint: OutPoint) -> Self {
        Self {
            id: outpoint.to_string(),
            status: UtxoStatus::Unspent,
            txid: outpoint.txid,
            vout: outpoint.vout,
            address: None,
            script_pubkey: None,
            asset: None,
            amount_sat: None,
            block_height: None,
            block_time: None,
            spending_txid: None,
            spending_vin: None,
            spending_block_time: None,
            extra: Map::new(),
        }
    }

    fn from_address_utxo(address: &str, utxo: &AddressUtxo) -> Self {
        Self {
            address: Some(address.to_owned()),
            asset: utxo.asset.clone(),
            amount_sat: utxo.value,
            block_height: utxo.status.block_height,
            block_time: utxo.status.block_time,
            ..Self::unspent(utxo.outpoint())
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

// ==============================================================================
// Documents
// ==============================================================================

/// A wrapped snapshot document. Header fields absent from a file stay absent
/// when it is rewritten, and unknown top-level fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<LiquidNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Map<String, Value>>,
    pub utxos: Vec<UtxoRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snapshot {
    pub fn new(
        network: LiquidNetwork,
        wallet: Map<String, Value>,
        utxos: Vec<UtxoRecord>,
    ) -> Result<Self, CoreError> {
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| CoreError::Snapshot(format!("format timestamp: {e}")))?;
        Ok(Self {
            schema: Some(SNAPSHOT_SCHEMA.to_owned()),
            network: Some(network),
            generated_at: Some(generated_at),
            wallet: Some(wallet),
            utxos,
            extra: Map::new(),
        })
    }
}

/// A snapshot file as found on disk: either a full [`Snapshot`] or a bare
/// array of records. Rewriting keeps the original shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDocument {
    Wrapped(Snapshot),
    Bare(Vec<UtxoRecord>),
}

impl SnapshotDocument {
    pub fn records(&self) -> &[UtxoRecord] {
        match self {
            Self::Wrapped(snapshot) => &snapshot.utxos,
            Self::Bare(records) => records,
        }
    }

    pub fn records_mut(&mut self) -> &mut [UtxoRecord] {
        match self {
            Self::Wrapped(snapshot) => &mut snapshot.utxos,
            Self::Bare(records) => records,
        }
    }
}

// ==============================================================================
// Collection and Enrichment
// ==============================================================================

/// List the unspent outputs of every address, deduplicated by outpoint.
///
/// A failed address lookup aborts collection: a snapshot that silently
/// misses an address would poison later comparisons.
pub async fn collect_address_utxos(
    explorer: &dyn Explorer,
    addresses: &[String],
) -> Result<Vec<UtxoRecord>, CoreError> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for address in addresses {
        let utxos = explorer.get_address_utxos(address).await?;
        debug!(%address, count = utxos.len(), "listed address utxos");
        records.extend(
            utxos
                .iter()
                .filter(|utxo| seen.insert(utxo.outpoint()))
                .map(|utxo| UtxoRecord::from_address_utxo(address, utxo)),
        );
    }

    info!(
        addresses = addresses.len(),
        utxos = records.len(),
        "collected address utxos"
    );
    Ok(records)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub checked: usize,
    pub spent: usize,
    pub unspent: usize,
    pub failed: usize,
}

/// Refresh the spend status of every record from the explorer.
///
/// Records whose lookup fails are left untouched and counted as failed.
pub async fn enrich_records(explorer: &dyn Explorer, records: &mut [UtxoRecord]) -> EnrichReport {
    let mut report = EnrichReport::default();

    for record in records.iter_mut() {
        report.checked += 1;
        if record.id.is_empty() {
            record.id = record.outpoint().to_string();
        }

        let outspend = match explorer.get_outspend(&record.txid, record.vout).await {
            Ok(outspend) => outspend,
            Err(err) => {
                debug!(outpoint = %record.outpoint(), error = %err, "outspend lookup failed");
                report.failed += 1;
                continue;
            }
        };

        if outspend.spent {
            record.status = UtxoStatus::Spent;
            record.spending_txid = outspend.txid;
            record.spending_vin = outspend.vin;
            record.spending_block_time = outspend.status.and_then(|s| s.block_time);
            report.spent += 1;
        } else {
            record.status = UtxoStatus::Unspent;
            record.spending_txid = None;
            record.spending_vin = None;
            record.spending_block_time = None;
            report.unspent += 1;
        }
    }

    info!(
        checked = report.checked,
        spent = report.spent,
        unspent = report.unspent,
        failed = report.failed,
        "enriched snapshot records"
    );
    report
}
