//! Serialized lock coordination for Gridlock lattices.
//!
//! A single worker thread owns one lock bit and one FIFO waiter queue per
//! cell. Every lock, release and area request funnels through it, so lock
//! state never races. Contended single-cell requests are parked, never
//! retried, and released cells are handed directly to the oldest waiter.
//!
//! ```text
//! Caller thread(s)            gridlock-sync worker          Executor
//!     |                              |                          |
//!     |--lock_cell(c, cb)----------->| free?  lock, dispatch ---->| cb(Ok)
//!     |   [unbounded channel]        | locked? park cb          |
//!     |--release_lock(c)------------>| waiter? hand off ------->| next cb(Ok)
//!     |                              | else    free             |
//!     |--lock_area(c, r, done)------>| try every ring cell      |
//!     |                              | dispatch map ----------->| done(map)
//! ```
//!
//! Completions run on a configurable [`Executor`]: inline on the worker, a
//! thread pool, or a caller-pumped queue. A completion may issue new
//! requests, including re-locking the cell it was just granted; those are
//! queued behind the current request, never run in-line.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod executor;
pub mod metrics;
pub mod table;
mod worker;

pub use config::{ConfigError, CoordinatorConfig, OverflowPolicy, ThreadPoolConfig};
pub use coordinator::{LockCoordinator, LockHandle};
pub use executor::{ChannelExecutor, Executor, InlineExecutor, Job, JobReceiver, ThreadPoolExecutor};
pub use metrics::LockMetrics;
pub use table::{LockMap, LockTable};

pub use gridlock_core::LockError;
