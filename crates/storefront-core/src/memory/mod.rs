//! In-process implementations of every storage and queue capability.
//!
//! State lives behind [`tokio::sync::Mutex`] and is shared by clones, so a
//! test can hand one clone to the code under test and inspect another.

mod blob_store;
mod login_log;
mod message_queue;
mod profile_store;

pub use blob_store::MemoryBlobStore;
pub use login_log::{DEFAULT_MAX_FILE_BYTES, MemoryLoginLog};
pub use message_queue::{MemoryQueue, SETTLED_HISTORY_LIMIT};
pub use profile_store::MemoryProfileStore;
