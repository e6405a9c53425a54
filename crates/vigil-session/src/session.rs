//! The per-connection session record.

use std::time::Instant;

use vigil_types::Position;

/// Ephemeral authentication state for one connected player.
///
/// Created on join, destroyed on leave; never persisted. The
/// `authenticated` flag is the single source of truth for whether
/// protective blocking applies — every other field is auxiliary
/// bookkeeping for the unauthenticated window (timers, the position to
/// restore) or short-lived post-login state (invincibility, logout
/// cooldown).
///
/// Invariant: while `authenticated` is `true` there is no saved position
/// pending restoration, and the timeout/reminder timers are not
/// consulted.
#[derive(Debug, Clone)]
pub struct Session {
    /// Whether this player has proven their identity this connection.
    pub authenticated: bool,
    /// When the current unauthenticated window opened (join or logout).
    /// Timeout is measured from here.
    pub joined_at: Instant,
    /// When the last reminder was sent. `None` means never, which makes
    /// the first reminder fire on the next tick.
    pub last_reminder: Option<Instant>,
    /// Where the player stood before the holding teleport, restored on
    /// successful authentication.
    pub saved_position: Option<Position>,
    /// Until when another logout is refused. Survives login (the cooldown
    /// is measured logout-to-logout), dies with the session.
    pub cooldown_until: Option<Instant>,
    /// Until when incoming damage is suppressed after authentication.
    pub invincible_until: Option<Instant>,
}

impl Session {
    /// A fresh unauthenticated session, as created on join.
    pub fn new(now: Instant, saved_position: Position) -> Self {
        Self {
            authenticated: false,
            joined_at: now,
            last_reminder: None,
            saved_position: Some(saved_position),
            cooldown_until: None,
            invincible_until: None,
        }
    }
}
