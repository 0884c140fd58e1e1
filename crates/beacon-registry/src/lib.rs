//! beacon-registry — in-memory system registry and its expiry sweeper.
//! The HTTP layer and daemon build on this crate.

pub mod registry;
pub mod sweeper;

pub use registry::{AnnounceError, Registry, RetentionPolicy, SystemEntry, DEFAULT_DISPLAY_NAME};
pub use sweeper::sweep_loop;
