//! Quote shelf: a small categorized quote list with local persistence and
//! periodic reconciliation against a remote collection.
//!
//! - [`storage`] persists the list and the selected category as key-value slots
//! - [`store`] owns the in-memory list and applies every mutation
//! - [`view`] holds the pure filter and presentation helpers
//! - [`sync`] fetches, merges and pushes against the remote endpoint

pub mod config;
pub mod storage;
pub mod store;
pub mod sync;
pub mod util;
pub mod view;
