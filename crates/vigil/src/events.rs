//! The event router: the host-facing surface of the engine.
//!
//! The host forwards each of its events into exactly one method here.
//! `player_joined` / `player_left` / `tick` feed the session manager;
//! the `allow_*` family answers "should this event proceed?" so the
//! host's handlers stay one-liners:
//!
//! ```text
//! host event                        router method
//! ---------------------------------------------------------------
//! join                              player_joined
//! leave / disconnect                player_left
//! server tick                       tick
//! chat message                      allow_chat
//! command execution                 allow_command
//! block break/place, item use,      allow_action
//!   entity interaction, item drop
//! damage to a player                allow_damage_received
//! damage from a player              allow_damage_dealt
//! ```

use std::sync::Arc;
use std::time::Instant;

use vigil_session::{AuthManager, ProtectionGate, command_allowed};
use vigil_types::Player;

/// Routes host events into the session manager and protection gate.
pub struct EventRouter<P: Player> {
    manager: Arc<AuthManager<P>>,
    gate: ProtectionGate<P>,
}

impl<P: Player> EventRouter<P> {
    pub fn new(manager: Arc<AuthManager<P>>) -> Self {
        let gate = ProtectionGate::new(Arc::clone(&manager));
        Self { manager, gate }
    }

    /// The manager, for command handlers (login/register/logout/admin).
    pub fn manager(&self) -> &Arc<AuthManager<P>> {
        &self.manager
    }

    /// The gate, for hosts that want the raw decisions.
    pub fn gate(&self) -> &ProtectionGate<P> {
        &self.gate
    }

    /// A player connected.
    pub fn player_joined(&self, player: &Arc<P>) {
        self.manager.on_join(player);
    }

    /// A player disconnected (for any reason, kicks included).
    pub fn player_left(&self, player: &P) {
        self.manager.on_leave(player);
    }

    /// One server tick: timeouts, reminders, movement correction.
    pub fn tick(&self) {
        self.manager.on_tick(Instant::now());
    }

    /// Whether a chat line from this player should go through. A
    /// swallowed line earns the player one "authenticate first" notice.
    pub fn allow_chat(&self, player: &P) -> bool {
        if !self.manager.config().block_chat {
            return true;
        }
        if !self.gate.should_block_action(player) {
            return true;
        }
        self.manager.notify_blocked(player);
        false
    }

    /// Whether a command from this player should run. Authentication
    /// commands are always allowed — they're the way out of limbo.
    pub fn allow_command(&self, player: &P, command_text: &str) -> bool {
        if !self.gate.should_block_action(player) {
            return true;
        }
        if command_allowed(command_text) {
            return true;
        }
        self.manager.notify_blocked(player);
        false
    }

    /// Whether a world interaction (block break/place, item use, entity
    /// interaction, item drop) should proceed. Silent on denial: these
    /// fire far too often to notify on each one.
    pub fn allow_action(&self, player: &P) -> bool {
        !self.gate.should_block_action(player)
    }

    /// Whether damage to this player should be applied.
    pub fn allow_damage_received(&self, player: &P) -> bool {
        !self.gate.should_block_damage_received(player)
    }

    /// Whether damage dealt by this player should be applied.
    pub fn allow_damage_dealt(&self, player: &P) -> bool {
        !self.gate.should_block_damage_dealt(player)
    }
}
