//! Outpoint extraction from snapshot JSON.
//!
//! Snapshots arrive either as `{"utxos": [...]}` or as a bare array of UTXO
//! records. Only `txid` and `vout` are read; everything else is ignored.

use std::collections::HashSet;

use bitcoin::{OutPoint, Txid};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Extract outpoints from a snapshot document, in input order.
///
/// Records without a parsable `txid` and non-negative 32-bit `vout` are
/// skipped. Duplicates are kept. Documents of any other shape yield nothing.
pub fn parse_outpoints(doc: &Value) -> Vec<OutPoint> {
    let records: &[Value] = match doc {
        Value::Array(records) => records.as_slice(),
        Value::Object(map) => match map.get("utxos") {
            Some(Value::Array(records)) => records.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let parsed = parse_record(record);
            if parsed.is_none() {
                debug!(index, "skipping snapshot record without usable txid/vout");
            }
            parsed
        })
        .collect()
}

/// The outpoints to search for. Only membership matters.
pub fn load_targets(doc: &Value) -> HashSet<OutPoint> {
    parse_outpoints(doc).into_iter().collect()
}

/// The outpoints that seed the first hop.
pub fn load_start(doc: &Value) -> Vec<OutPoint> {
    parse_outpoints(doc)
}

fn parse_record(record: &Value) -> Option<OutPoint> {
    let txid = parse_txid(record.get("txid")?.as_str()?)?;
    let vout = coerce_vout(record.get("vout")?)?;
    Some(OutPoint::new(txid, vout))
}

fn parse_txid(s: &str) -> Option<Txid> {
    s.trim().parse().ok()
}

/// Serde adapter so typed snapshot records accept the same `txid` values as
/// [`parse_outpoints`].
pub(crate) fn deserialize_txid<'de, D>(deserializer: D) -> Result<Txid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_txid(&raw).ok_or_else(|| D::Error::custom(format!("invalid txid `{raw}`")))
}

/// Serde adapter so typed snapshot records accept the same `vout` values as
/// [`parse_outpoints`].
pub(crate) fn deserialize_vout<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    coerce_vout(&raw).ok_or_else(|| D::Error::custom(format!("invalid vout {raw}")))
}

// Wallet exports are inconsistent about numeric types: accept unsigned
// integers, integral floats and decimal strings.
fn coerce_vout(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                return u32::try_from(n).ok();
            }
            let f = n.as_f64()?;
            (f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f)).then_some(f as u32)
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
