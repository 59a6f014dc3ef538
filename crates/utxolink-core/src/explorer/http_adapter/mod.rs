//! Esplora REST client.
//!
//! Implements [`Explorer`](super::Explorer) over HTTP using `reqwest`, with
//! a single-slot request pacer and uniform failure reporting.

mod client;
mod connection;

pub use client::EsploraClient;
