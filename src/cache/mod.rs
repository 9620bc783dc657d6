//! Content-addressed cache of synthesis results.
//!
//! A request is identified by a [`Fingerprint`] of its rendered markup and full
//! configuration; the [`ResultStore`] maps fingerprints to audio and record files
//! in an output directory. The cache is append-only: nothing here evicts, expires
//! or rewrites an entry.
//!
//! Concurrent processes synthesizing the same fingerprint are not excluded from
//! each other. Both may call the provider; the last record written wins.

pub mod fingerprint;
pub mod store;

pub use fingerprint::{fingerprint, Fingerprint};
pub use store::ResultStore;
