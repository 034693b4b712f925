//! Remote reconciliation for the quote list.
//!
//! - [`client`] talks to the remote collection (GET to fetch, POST to push)
//! - [`merge`] folds a fetched collection into the local list, remote wins
//! - [`task`] runs fetch + merge on a fixed interval with a cancel handle
//!
//! ```ignore
//! let store = Arc::new(Mutex::new(QuoteStore::load(db).await?));
//! let client = RemoteClient::from_config(&config)?;
//! let (tx, mut rx) = mpsc::channel(8);
//! let handle = SyncTask::spawn(store.clone(), client, config.sync_period(), tx);
//! while let Some(event) = rx.recv().await { /* report */ }
//! handle.cancel();
//! ```

mod client;
mod merge;
mod task;

pub use client::{push_in_background, RemoteClient, SyncError};
pub use merge::{merge, MergeOutcome, MergeReport};
pub use task::{sync_once, SharedStore, SyncEvent, SyncHandle, SyncTask};
