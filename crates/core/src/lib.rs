//! bkt-core: Core library for the bkt object-store shell
//!
//! This crate provides the pieces of the shell that do not depend on any
//! particular SDK:
//! - Configuration (credentials, session settings, config file)
//! - The ObjectStore trait and the object metadata it returns
//! - Full-bucket listing across pages
//! - Key/path mapping for downloads and uploads
//! - An in-memory ObjectStore for tests

pub mod config;
pub mod error;
pub mod listing;
pub mod memory;
pub mod path;
pub mod traits;

pub use config::{
    CommandKind, ConfigManager, FileConfig, OnEmpty, SessionSettings, SizeUnit, StoreConfig,
    StoreDefaults,
};
pub use error::{Error, Result};
pub use listing::{list_all, Listing};
pub use memory::MemoryStore;
pub use traits::{ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore};
