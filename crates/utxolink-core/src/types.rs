//! Domain types for the spend-graph search.
//!
//! Contains the search configuration (`SearchOptions`, `SearchMode`), the
//! per-hop report (`RoundStats`), and the run result (`SearchSummary`,
//! `TargetMatch`).

use std::time::Duration;

use bitcoin::OutPoint;
use serde::{Deserialize, Serialize};

// ==============================================================================
// Search Mode
// ==============================================================================

/// Which edges the search follows from an outpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Follow spends only: every output of the transaction spending an
    /// outpoint is a neighbour.
    #[default]
    Descendants,
    /// Also follow funding: every prevout spent by the outpoint's own
    /// transaction is a neighbour.
    Bidirectional,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Descendants => write!(f, "descendants"),
            Self::Bidirectional => write!(f, "bidirectional"),
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "descendants" => Ok(Self::Descendants),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(format!(
                "unknown search mode `{other}`; expected descendants or bidirectional"
            )),
        }
    }
}

// ==============================================================================
// Search Options
// ==============================================================================

/// Configurable behaviour of a spend search. None of these bound the search;
/// it runs until cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub mode: SearchMode,
    /// Ignore spends that are still in the mempool.
    pub confirmed_only: bool,
    /// Pause between hops once the frontier has run dry.
    pub idle_interval: Duration,
    /// Capacity of the fetched-transaction cache; zero disables it.
    pub tx_cache_capacity: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::Descendants,
            confirmed_only: false,
            idle_interval: Duration::from_secs(5),
            tx_cache_capacity: 10_000,
        }
    }
}

// ==============================================================================
// Round and Run Results
// ==============================================================================

/// Counters for one completed hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub hop: u64,
    /// Outpoints taken off the frontier and expanded this hop.
    pub processed: usize,
    /// Outpoints first reached this hop; they form the next frontier.
    pub new_in_round: usize,
}

/// A target outpoint reached by the search, with the hop that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetMatch {
    pub outpoint: OutPoint,
    pub hop: u64,
}

/// State of a search after its last fully completed hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub hops_completed: u64,
    pub processed: u64,
    pub visited: usize,
    pub frontier: usize,
    pub matches: Vec<TargetMatch>,
}
