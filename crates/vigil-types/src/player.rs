//! The host-capability trait: everything Vigil is allowed to do to a player.
//!
//! Vigil never talks to the network or the game engine directly. The host
//! server (whatever it is) implements [`Player`] for its own player handle
//! and passes those handles into the session layer. Each method maps to a
//! capability the spec needs: reading and writing position, delivering
//! notices, and disconnecting.
//!
//! Implementations are expected to be internally synchronized — the session
//! layer calls these from the host's event threads and from the tick loop
//! without extra locking.

use crate::{PlayerId, Position};

/// A connected player, as seen by the authentication engine.
///
/// # Trait bounds
///
/// - `Send + Sync` — handles are shared across the tick task and the
///   host's event callbacks.
/// - `'static` — handles are stored in the session map for the lifetime
///   of the connection.
pub trait Player: Send + Sync + 'static {
    /// The player's stable identity.
    fn id(&self) -> PlayerId;

    /// The player's display name, used in notices and logs.
    fn name(&self) -> String;

    /// The network origin of this connection, as a printable address.
    /// Used as one of the two rate-limit keys. Return something stable
    /// like `"203.0.113.7"`; `"unknown"` is acceptable when the host
    /// can't tell.
    fn ip(&self) -> String;

    /// `true` for non-human sessions: automation, fake players spawned by
    /// other plugins, integration bots. Fake players bypass authentication
    /// entirely. Detection is host-specific and heuristic; Vigil only asks.
    fn is_fake(&self) -> bool {
        false
    }

    /// Current position and orientation.
    fn position(&self) -> Position;

    /// Moves the player, orientation and world included.
    fn teleport(&self, pos: &Position);

    /// Zeroes the player's velocity so physics can't carry them away from
    /// a freeze correction.
    fn halt_momentum(&self);

    /// A chat line, the ordinary notice channel.
    fn send_chat(&self, message: &str);

    /// A full-screen title and subtitle (the login prompt on join).
    fn send_title(&self, title: &str, subtitle: &str);

    /// Clears any title currently on screen.
    fn clear_title(&self);

    /// A transient message above the hotbar (reminders).
    fn send_action_bar(&self, message: &str);

    /// Plays a named sound effect to this player only. Unknown ids are
    /// the host's problem to ignore.
    fn play_sound(&self, sound_id: &str);

    /// Disconnects the player with the given reason.
    fn kick(&self, reason: &str);
}
