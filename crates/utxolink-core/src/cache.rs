use std::num::NonZeroUsize;
use std::sync::Arc;

use bitcoin::Txid;
use lru::LruCache;

use crate::error::CoreError;
use crate::explorer::{Explorer, Transaction};

// ==============================================================================
// Transaction Cache
// ==============================================================================

/// Bounded cache of fetched explorer transactions.
///
/// Consolidating spends make many frontier outpoints share one spending
/// transaction; the cache turns those repeated fetches into one request.
/// Owned by a single search, so no locking. A capacity of zero disables it.
pub struct TxCache {
    entries: Option<LruCache<Txid, Arc<Transaction>>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

impl TxCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, txid: &Txid) -> Option<Arc<Transaction>> {
        let found = self.entries.as_mut()?.get(txid).cloned();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn insert(&mut self, tx: Transaction) -> Arc<Transaction> {
        let tx = Arc::new(tx);
        if let Some(entries) = self.entries.as_mut() {
            entries.put(tx.txid, Arc::clone(&tx));
        }
        tx
    }

    /// Return the cached transaction or fetch it through `explorer`.
    /// Failed fetches are not cached.
    pub async fn get_or_fetch(
        &mut self,
        explorer: &dyn Explorer,
        txid: &Txid,
    ) -> Result<Arc<Transaction>, CoreError> {
        if let Some(cached) = self.get(txid) {
            return Ok(cached);
        }
        let tx = explorer.get_transaction(txid).await?;
        Ok(self.insert(tx))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.as_ref().map_or(0, LruCache::len),
        }
    }
}
