//! The protection gate: pure blocking decisions for host event handlers.
//!
//! The host wires these questions into every protected event (block
//! break/place, item use, entity interaction, item drop, chat, command,
//! damage) and cancels the event when the answer is "block". No state
//! lives here; everything delegates to the manager's queries.

use std::sync::Arc;

use vigil_types::Player;

use crate::AuthManager;

/// Commands an unauthenticated player may still run, lowercase. Without
/// this list the command gate would block the very commands that
/// authenticate you.
const ALLOWED_COMMANDS: &[&str] = &[
    "login",
    "l",
    "register",
    "reg",
    "vigil:login",
    "vigil:l",
    "vigil:register",
    "vigil:reg",
];

/// Whether `command_text` is one of the commands an unauthenticated
/// player is allowed to run. Accepts the full typed line: the leading
/// `/` is stripped and only the first token is matched,
/// case-insensitively.
pub fn command_allowed(command_text: &str) -> bool {
    let text = command_text.strip_prefix('/').unwrap_or(command_text);
    let root = text.split_whitespace().next().unwrap_or("");
    ALLOWED_COMMANDS.contains(&root.to_ascii_lowercase().as_str())
}

/// Decision layer consulted by the host's event handlers.
pub struct ProtectionGate<P: Player> {
    manager: Arc<AuthManager<P>>,
}

impl<P: Player> ProtectionGate<P> {
    pub fn new(manager: Arc<AuthManager<P>>) -> Self {
        Self { manager }
    }

    /// Whether a world-interaction by this player should be cancelled.
    /// `false` for fake players and for anyone authenticated.
    pub fn should_block_action(&self, player: &P) -> bool {
        self.manager.should_block(player)
    }

    /// Whether damage *to* this player should be cancelled: yes while
    /// unauthenticated (config-gated) and yes inside the post-login
    /// invincibility window, whichever applies.
    pub fn should_block_damage_received(&self, player: &P) -> bool {
        if self.manager.is_invincible(player.id()) {
            return true;
        }
        self.manager.config().block_damage_received && self.manager.should_block(player)
    }

    /// Whether damage *dealt by* this player should be cancelled.
    pub fn should_block_damage_dealt(&self, player: &P) -> bool {
        self.manager.config().block_damage_dealt && self.manager.should_block(player)
    }

    /// See [`command_allowed`].
    pub fn is_command_allowed(&self, command_text: &str) -> bool {
        command_allowed(command_text)
    }
}
