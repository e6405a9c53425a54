//! Shared vocabulary for Vigil.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identity** ([`PlayerId`]) — who a player is, stable across sessions.
//! - **Space** ([`Position`]) — where a player is, including orientation
//!   and world, so the session layer can freeze and restore them.
//! - **Capability** ([`Player`]) — what the host game server lets us do
//!   to a connected player (read position, teleport, deliver notices,
//!   disconnect).
//!
//! # How it fits in the stack
//!
//! ```text
//! Host adapter (above)  ← implements Player for its own player handle
//!     ↕
//! Session Layer         ← tracks auth state per PlayerId, drives Player
//!     ↕
//! Types (this crate)    ← no dependencies on anything above
//! ```

mod player;
mod types;

pub use player::Player;
pub use types::{PlayerId, Position};
