//! Durable account storage for Vigil.
//!
//! One JSON file maps player ids to [`Account`] records. Every mutation
//! rewrites the whole file through a temp-write / backup / atomic-rename
//! protocol, so the durable file is never observed half-written even if
//! the process dies mid-save. That's O(accounts) work per mutation, which
//! is fine: registrations and password changes are rare events compared to
//! the reads the rest of the engine does.
//!
//! I/O failures never escape this crate as panics or fatal errors. A
//! failed load starts the store empty; a failed save leaves the in-memory
//! map authoritative until the next save succeeds. Both are logged.

mod account;
mod error;
mod store;

pub use account::{Account, unix_millis};
pub use error::StoreError;
pub use store::AccountStore;
