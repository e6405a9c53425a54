//! # Vigil
//!
//! Join authentication for shared multiplayer game worlds.
//!
//! New connections are held in an unauthenticated limbo — frozen in
//! place, unable to act, chat, or take damage — until they prove
//! ownership of an account with `/login` or create one with `/register`.
//! Idle connections are kicked, failed attempts are rate limited with a
//! lockout, and accounts live in a crash-safe JSON store.
//!
//! Vigil knows nothing about any particular game server. The host
//! implements one trait ([`Player`]) for its player handle, forwards its
//! events into an [`EventRouter`], and cancels whatever the router says
//! to cancel:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil::prelude::*;
//!
//! let store = Arc::new(AccountStore::open("data/vigil"));
//! store.load();
//! let manager = Arc::new(AuthManager::new(AuthConfig::default(), store));
//! let router = Arc::new(EventRouter::new(manager));
//!
//! // host wiring (pseudo-code):
//! // on player join      -> router.player_joined(&player)
//! // on player leave     -> router.player_left(&player)
//! // on chat             -> if !router.allow_chat(&player) { cancel }
//! // on command          -> if !router.allow_command(&player, &line) { cancel }
//! // on block/item/entity/drop events
//! //                     -> if !router.allow_action(&player) { cancel }
//! // on damage           -> if !router.allow_damage_received(&victim) { cancel }
//! //                     -> if !router.allow_damage_dealt(&attacker) { cancel }
//! // every server tick   -> router.tick()
//! ```
//!
//! Hosts without their own tick source can spawn the bundled
//! [`TickDriver`] on a Tokio runtime instead of calling
//! [`EventRouter::tick`] themselves.

mod error;
mod events;
mod tick;

pub use error::VigilError;
pub use events::EventRouter;
pub use tick::TickDriver;

/// Everything a host adapter typically needs.
pub mod prelude {
    pub use crate::{EventRouter, TickDriver, VigilError};
    pub use vigil_credential::CredentialHasher;
    pub use vigil_session::{
        AuthConfig, AuthManager, ChangePasswordOutcome, HoldingLocation, LoginOutcome,
        LogoutOutcome, Messages, ProtectionGate, RegisterOutcome,
    };
    pub use vigil_store::{Account, AccountStore};
    pub use vigil_types::{Player, PlayerId, Position};
}
