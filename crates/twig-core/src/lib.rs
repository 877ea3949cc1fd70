//! twig-core: Core library for the twig todo manager
//!
//! Provides the data model, storage adapters, the todo store and its
//! change notifications. No database, no daemon - just two JSON entries
//! in a key-value store.

pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod stats;
pub mod storage;
pub mod store;
pub mod todo;

pub use config::Config;
pub use error::Error;
pub use events::{EventKind, LoggingObserver, Notifier, Observer, ObserverId, TodoEvent};
pub use id::generate_id;
pub use stats::Statistics;
pub use storage::{FileStorage, MemoryStorage, StorageAdapter};
pub use store::{StatusFilter, StoreOptions, TodoStore};
pub use todo::{Status, TodoRecord};

/// Result type for twig operations
pub type Result<T> = std::result::Result<T, Error>;
