pub mod cache;
pub mod error;
pub mod explorer;
pub mod outpoint;
pub mod search;
pub mod snapshot;
#[cfg(test)]
mod test_util;
pub mod types;

pub use bitcoin::{OutPoint, Txid};
pub use error::{CoreError, ExplorerError};
pub use search::{SearchObserver, SpendSearch};
pub use types::{RoundStats, SearchMode, SearchOptions, SearchSummary, TargetMatch};
