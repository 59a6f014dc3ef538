use std::collections::HashSet;

use bitcoin::OutPoint;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::cache::TxCache;
use crate::explorer::Explorer;
use crate::types::{RoundStats, SearchMode, SearchOptions, SearchSummary, TargetMatch};

// ==============================================================================
// Observer
// ==============================================================================

/// Progress callbacks for a running [`SpendSearch`].
///
/// Callbacks run inline on the search task and cannot fail. Every method
/// defaults to doing nothing.
pub trait SearchObserver {
    fn on_round_begin(&mut self, _hop: u64) {}

    fn on_found(&mut self, _outpoint: &OutPoint, _hop: u64) {}

    fn on_round_end(&mut self, _round: &RoundStats) {}
}

impl SearchObserver for () {}

// ==============================================================================
// Spend Search
// ==============================================================================

/// Unbounded breadth-first search over the spend graph.
///
/// Starting from a set of outpoints, each hop asks the explorer whether every
/// frontier outpoint has been spent and, if so, enqueues every output of the
/// spending transaction. Outpoints are deduplicated by a visited set that
/// only grows, so no outpoint is expanded twice. A target outpoint is
/// reported once, in the hop that first reaches it (seeds: hop 0).
///
/// The search has no exit condition. [`run`](Self::run) loops until its
/// cancellation token fires; [`step`](Self::step) runs a single hop and can
/// be called repeatedly to drive the search by hand.
///
/// Per-outpoint explorer failures are absorbed: the outpoint contributes no
/// neighbours that hop and, being visited, is never retried.
pub struct SpendSearch {
    targets: HashSet<OutPoint>,
    frontier: Vec<OutPoint>,
    visited: HashSet<OutPoint>,
    hop: u64,
    processed: u64,
    matches: Vec<TargetMatch>,
    options: SearchOptions,
    tx_cache: TxCache,
}

impl SpendSearch {
    /// Seed the frontier with `start` (deduplicated, order kept) and mark
    /// every seed visited.
    pub fn new(
        start: impl IntoIterator<Item = OutPoint>,
        targets: HashSet<OutPoint>,
        options: SearchOptions,
    ) -> Self {
        let mut visited = HashSet::new();
        let frontier: Vec<OutPoint> = start
            .into_iter()
            .filter(|outpoint| visited.insert(*outpoint))
            .collect();

        Self {
            targets,
            frontier,
            visited,
            hop: 0,
            processed: 0,
            matches: Vec::new(),
            tx_cache: TxCache::with_capacity(options.tx_cache_capacity),
            options,
        }
    }

    /// The hop the next call to [`step`](Self::step) will run.
    pub fn hop(&self) -> u64 {
        self.hop
    }

    pub fn frontier(&self) -> &[OutPoint] {
        &self.frontier
    }

    pub fn is_visited(&self, outpoint: &OutPoint) -> bool {
        self.visited.contains(outpoint)
    }

    pub fn matches(&self) -> &[TargetMatch] {
        &self.matches
    }

    pub fn summary(&self) -> SearchSummary {
        SearchSummary {
            hops_completed: self.hop,
            processed: self.processed,
            visited: self.visited.len(),
            frontier: self.frontier.len(),
            matches: self.matches.clone(),
        }
    }

    /// Run hops until `cancel` fires, then return the summary.
    ///
    /// Cancellation is only observed between hops; a hop in progress always
    /// completes, so the summary reflects whole hops. While the frontier is
    /// empty, hops keep running every `idle_interval`.
    pub async fn run(
        &mut self,
        explorer: &dyn Explorer,
        observer: &mut dyn SearchObserver,
        cancel: &CancellationToken,
    ) -> SearchSummary {
        info!(
            start = self.frontier.len(),
            targets = self.targets.len(),
            mode = %self.options.mode,
            "spend search started"
        );

        while !cancel.is_cancelled() {
            self.step(explorer, observer).await;

            if self.frontier.is_empty() && !cancel.is_cancelled() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.options.idle_interval) => {}
                }
            }
        }

        let summary = self.summary();
        let cache = self.tx_cache.stats();
        info!(
            hops = summary.hops_completed,
            processed = summary.processed,
            visited = summary.visited,
            matches = summary.matches.len(),
            cache_hits = cache.hits,
            cache_misses = cache.misses,
            "spend search stopped"
        );
        summary
    }

    /// Run exactly one hop over the current frontier.
    pub async fn step(
        &mut self,
        explorer: &dyn Explorer,
        observer: &mut dyn SearchObserver,
    ) -> RoundStats {
        let hop = self.hop;
        observer.on_round_begin(hop);

        let this_round = std::mem::take(&mut self.frontier);
        let mut new_in_round = 0;

        for outpoint in &this_round {
            // Seeds never pass through discovery, so they are tested here.
            if hop == 0 {
                self.check_target(outpoint, hop, observer);
            }

            let neighbours = self.neighbours(explorer, outpoint).await;
            for child in neighbours {
                if self.visited.insert(child) {
                    self.frontier.push(child);
                    new_in_round += 1;
                    self.check_target(&child, hop, observer);
                }
            }
        }

        let round = RoundStats {
            hop,
            processed: this_round.len(),
            new_in_round,
        };
        self.processed += round.processed as u64;
        debug!(
            hop,
            processed = round.processed,
            new_in_round,
            visited = self.visited.len(),
            "hop complete"
        );
        observer.on_round_end(&round);

        self.hop += 1;
        round
    }

    fn check_target(&mut self, outpoint: &OutPoint, hop: u64, observer: &mut dyn SearchObserver) {
        if self.targets.contains(outpoint) {
            self.matches.push(TargetMatch {
                outpoint: *outpoint,
                hop,
            });
            observer.on_found(outpoint, hop);
        }
    }

    // ==========================================================================
    // Expansion
    // ==========================================================================

    async fn neighbours(&mut self, explorer: &dyn Explorer, outpoint: &OutPoint) -> Vec<OutPoint> {
        let mut neighbours = self.spend_children(explorer, outpoint).await;
        if self.options.mode == SearchMode::Bidirectional {
            neighbours.extend(self.funding_parents(explorer, outpoint).await);
        }
        neighbours
    }

    /// Every output of the transaction that spent `outpoint`, or nothing if
    /// it is unspent or the explorer could not say.
    async fn spend_children(
        &mut self,
        explorer: &dyn Explorer,
        outpoint: &OutPoint,
    ) -> Vec<OutPoint> {
        let outspend = match explorer.get_outspend(&outpoint.txid, outpoint.vout).await {
            Ok(outspend) => outspend,
            Err(err) => {
                debug!(%outpoint, error = %err, "outspend lookup failed; not expanding");
                return Vec::new();
            }
        };

        let Some(spender) = outspend.spender() else {
            if outspend.spent {
                debug!(%outpoint, "explorer reported a spend without a spending txid");
            }
            return Vec::new();
        };
        if self.options.confirmed_only && !outspend.is_confirmed() {
            trace!(%outpoint, %spender, "skipping unconfirmed spend");
            return Vec::new();
        }

        match self.tx_cache.get_or_fetch(explorer, &spender).await {
            Ok(tx) => (0..tx.output_count() as u32)
                .map(|vout| OutPoint::new(spender, vout))
                .collect(),
            Err(err) => {
                debug!(%outpoint, %spender, error = %err, "spending tx lookup failed; not expanding");
                Vec::new()
            }
        }
    }

    /// Every prevout spent by the transaction that created `outpoint`.
    async fn funding_parents(
        &mut self,
        explorer: &dyn Explorer,
        outpoint: &OutPoint,
    ) -> Vec<OutPoint> {
        match self.tx_cache.get_or_fetch(explorer, &outpoint.txid).await {
            Ok(tx) => tx.funding_outpoints().collect(),
            Err(err) => {
                debug!(%outpoint, error = %err, "funding tx lookup failed; not expanding inputs");
                Vec::new()
            }
        }
    }
}

// ==============================================================================
// Tests
// ==============================================================================
