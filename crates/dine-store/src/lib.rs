//! Persisted key-value stores for the dine restaurant client.
//!
//! This crate defines the [`KeyValueStore`] contract the favorites cache and
//! the session store are written against, and two backends:
//!
//! - [`MemoryStore`] - process-local, never fails
//! - [`FileStore`] - one JSON file on disk, written atomically
//!
//! [`SessionStore`] layers typed auth-session accessors over any backend.
//!
//! # Example
//!
//! ```no_run
//! use dine_store::{FileStore, SessionStore};
//!
//! # async fn example() -> Result<(), dine_store::StoreError> {
//! let session = SessionStore::new(FileStore::new(".dine/store.json"));
//! session.save_token("abc").await?;
//! assert_eq!(session.token().await?.as_deref(), Some("abc"));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod file;
pub mod kv;
pub mod memory;
pub mod session;

pub use error::StoreError;
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use session::{ACCESS_KEY, SessionStore, TOKEN_KEY, USER_KEY};
