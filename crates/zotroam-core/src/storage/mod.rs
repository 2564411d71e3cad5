//! Storage layer
//!
//! Holds the last committed snapshot of every `(data type, library,
//! identity)` triple.
//!
//! ## Architecture
//!
//! - **DurableCache**: opaque key-value interface used by the sync engine
//! - **FileCache**: JSON file per key, written atomically
//! - **MemoryCache**: process-local store for tests and one-shot runs

pub mod cache;
pub mod error;
pub mod file;

pub use cache::{CacheKey, DurableCache, MemoryCache};
pub use error::{CacheError, CacheResult};
pub use file::FileCache;
