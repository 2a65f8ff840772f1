//! Capability groups.
//!
//! Each group contributes a set of tool descriptors and the handler for them.
//! Filesystem tools live one per file under `fs/`; the smaller groups keep
//! their tools together with their backends.

pub mod cache;
pub mod docs;
pub mod fs;
pub mod pages;
pub mod system;

pub use cache::{CacheLookup, CacheStore, CacheTools, MemoryCache, StubCache};
pub use docs::{DocHit, DocSearch, DocSource, DocTools, StubDocs};
pub use fs::FilesystemTools;
pub use pages::{MemoryPages, Page, PageStore, PageTools, StubPages};
pub use system::SystemTools;
