//! Token synchronization.
//!
//! - **Reconcile**: tokens → variable store in write, alias and prune passes
//! - **Export**: store entries → nested design-token JSON
//!
//! # Example
//!
//! ```ignore
//! use tokensync::sync::{sync_collection, SyncOptions};
//!
//! let options = SyncOptions { overwrite_existing: true, ..SyncOptions::default() };
//! let summary = sync_collection(&mut storage, "Design Tokens", &tokens, &options, &mut ()).await?;
//! println!("{summary}");
//! ```

mod export;
mod reconcile;
mod types;

pub use export::{atomic_write, Exporter};
pub use reconcile::{reconcile, sync_collection};
pub use types::{
    ItemError, Progress, ProgressSink, Stage, SyncOptions, SyncSummary, DEFAULT_PROGRESS_INTERVAL,
};
