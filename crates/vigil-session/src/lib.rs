//! The authentication session engine.
//!
//! This crate is the heart of Vigil: the per-player state machine that
//! holds new connections in an unauthenticated limbo until they prove
//! ownership of an account (or create one), and the pure decision layer
//! the host's event handlers consult to block actions in the meantime.
//!
//! # The state machine
//!
//! ```text
//!               ┌──(login / register ok)──→ AUTHENTICATED
//!               │                               │
//! join ──→ UNAUTHENTICATED ←──────(logout)──────┘
//!               │
//!               └──(timeout kick / disconnect)──→ removed
//! ```
//!
//! Session state is ephemeral: disconnecting while unauthenticated (or
//! authenticated) discards everything, and the player starts over on
//! return. Only [`vigil_store`] accounts survive restarts.
//!
//! # Key types
//!
//! - [`AuthManager`] — orchestrates every transition; owns the sessions
//! - [`ProtectionGate`] — pure blocking decisions for host event handlers
//! - [`AuthConfig`] / [`Messages`] — tunables and notice templates
//! - [`LoginOutcome`] / [`RegisterOutcome`] / [`ChangePasswordOutcome`] /
//!   [`LogoutOutcome`] — typed results; rejections are values, not errors

mod config;
mod gate;
mod manager;
mod messages;
mod session;

pub use config::{AuthConfig, HoldingLocation, Messages};
pub use gate::{ProtectionGate, command_allowed};
pub use manager::{
    AuthManager, ChangePasswordOutcome, LoginOutcome, LogoutOutcome, RegisterOutcome,
};
pub use messages::{colorize, render};
pub use session::Session;
