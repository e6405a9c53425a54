//! Configuration for the session engine.
//!
//! A plain serde-derived struct: the host loads it from whatever file
//! format it likes and hands it over at startup (and again on reload via
//! [`AuthManager::reload_config`](crate::AuthManager::reload_config)).
//! Defaults are production-sensible; [`AuthConfig::validated`] clamps the
//! values that could otherwise wedge the engine.

use serde::{Deserialize, Serialize};
use vigil_credential::{DEFAULT_COST, MAX_COST};
use vigil_types::Position;

/// A fixed location unauthenticated players are kept at.
///
/// When configured, players are teleported here on join and re-snapped
/// whenever they drift more than a block and a half away horizontally.
/// When absent, players are frozen at the exact spot they joined at
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Host world/dimension identifier.
    pub world: String,
}

impl HoldingLocation {
    /// The holding location as a teleport target (zero orientation).
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z, self.world.clone())
    }
}

/// All tunables for the session engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    // -- Timing --
    /// Seconds an unauthenticated player may linger before being kicked.
    pub login_timeout_secs: u64,
    /// Seconds between action-bar reminders while unauthenticated.
    pub reminder_interval_secs: u64,

    // -- Logout --
    /// Whether players may voluntarily drop back to unauthenticated.
    pub logout_enabled: bool,
    /// Seconds that must pass between two logouts (measured from the
    /// previous logout, not the previous login).
    pub logout_cooldown_secs: u64,

    // -- Holding location --
    /// Where to keep unauthenticated players. `None` freezes them in
    /// place at their join position instead.
    pub holding: Option<HoldingLocation>,

    // -- Security --
    /// Argon2 time cost for new password hashes. Existing hashes carry
    /// their own parameters and are unaffected.
    pub hash_cost: u32,
    /// Failed attempts within the window before a key locks.
    pub max_attempts: u32,
    /// Sliding-window length for counting failures, in minutes.
    pub attempt_window_mins: u64,
    /// How long a locked key stays locked, in minutes.
    pub lockout_mins: u64,
    /// Minimum password length (in characters) accepted at registration
    /// and password change.
    pub min_password_len: usize,
    /// Whether the network origin is charged and checked as a rate-limit
    /// key alongside the account identity. Turn off when many players
    /// share one origin (NAT, proxies) and must not lock each other out.
    pub ip_rate_limiting: bool,
    /// Seconds of damage immunity granted after a successful login, so
    /// the moment of transition can't be exploited. 0 disables.
    pub invincibility_secs: u64,

    // -- Protection toggles --
    /// Re-snap / freeze unauthenticated players every tick.
    pub block_movement: bool,
    /// Swallow chat lines from unauthenticated players.
    pub block_chat: bool,
    /// Suppress damage *to* unauthenticated players.
    pub block_damage_received: bool,
    /// Suppress damage *dealt by* unauthenticated players.
    pub block_damage_dealt: bool,

    // -- Presentation --
    /// Sound effect id played on successful login/registration.
    pub sound_login_success: String,
    /// Sound effect id played on a failed login attempt.
    pub sound_login_fail: String,
    /// Server display name, available to templates as `{server}`.
    pub server_name: String,

    /// Notice templates. See [`Messages`] for the placeholder set.
    pub messages: Messages,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_timeout_secs: 60,
            reminder_interval_secs: 10,
            logout_enabled: true,
            logout_cooldown_secs: 30,
            holding: None,
            hash_cost: DEFAULT_COST,
            max_attempts: 5,
            attempt_window_mins: 5,
            lockout_mins: 10,
            min_password_len: 4,
            ip_rate_limiting: true,
            invincibility_secs: 10,
            block_movement: true,
            block_chat: true,
            block_damage_received: true,
            block_damage_dealt: true,
            sound_login_success: "entity.player.levelup".into(),
            sound_login_fail: "entity.villager.no".into(),
            server_name: "Server".into(),
            messages: Messages::default(),
        }
    }
}

impl AuthConfig {
    /// Clamps out-of-range values so the config is safe to run with.
    /// Applied automatically when the manager takes a config. Rules:
    ///
    /// - `hash_cost` clamped to the credential crate's supported range.
    /// - `max_attempts` floored at 1 (a limiter that locks on the 0th
    ///   failure would lock everyone out forever).
    /// - `login_timeout_secs` floored at 5 so a typo can't kick players
    ///   before they can type a password.
    pub fn validated(mut self) -> Self {
        self.hash_cost = self.hash_cost.clamp(1, MAX_COST);
        self.max_attempts = self.max_attempts.max(1);
        self.login_timeout_secs = self.login_timeout_secs.max(5);
        self
    }
}

/// Notice templates, all user-visible text in one place.
///
/// Placeholders are substituted at send time: `{player}`, `{server}`,
/// `{online}`, plus per-message extras — `{attempts}` (remaining login
/// attempts), `{minutes}` (lockout), `{seconds}` (logout cooldown) and
/// `{min}` (minimum password length). `&`-style color codes are
/// translated to `§` formatting codes on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub welcome: String,
    pub welcome_first_time: String,
    pub login_success: String,
    pub register_success: String,
    pub wrong_password: String,
    pub already_logged_in: String,
    pub not_registered: String,
    pub already_registered: String,
    pub kicked: String,
    pub rate_limited: String,
    pub password_changed: String,
    pub password_mismatch: String,
    pub wrong_old_password: String,
    pub password_too_short: String,
    pub logout_success: String,
    pub logout_cooldown: String,
    pub reminder: String,
    pub reminder_new: String,
    pub blocked: String,
    pub internal_error: String,
    pub title_login: String,
    pub subtitle_login: String,
    pub title_register: String,
    pub subtitle_register: String,
    /// For host command adapters: shown to an operator whose admin action
    /// targeted an unregistered account.
    pub admin_not_registered: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "&aWelcome, {player}! &7Use &e/login <password> &7to authenticate.".into(),
            welcome_first_time:
                "&aWelcome, {player}! &7First time? Use &e/register <password> <password>".into(),
            login_success: "&aSuccessfully logged in! Welcome back, {player}!".into(),
            register_success: "&aAccount created! You are now logged in.".into(),
            wrong_password: "&cIncorrect password. {attempts} attempts remaining.".into(),
            already_logged_in: "&7You are already logged in.".into(),
            not_registered: "&cYou are not registered. Use &e/register <password> <password>".into(),
            already_registered: "&cYou are already registered. Use &e/login <password>".into(),
            kicked: "&cYou took too long to login. Please reconnect and try again.".into(),
            rate_limited: "&cToo many failed attempts. Try again in {minutes} minutes.".into(),
            password_changed: "&aPassword changed successfully!".into(),
            password_mismatch: "&cPasswords do not match. Try again.".into(),
            wrong_old_password: "&cOld password is incorrect.".into(),
            password_too_short: "&cPassword must be at least {min} characters.".into(),
            logout_success: "&7You have been logged out.".into(),
            logout_cooldown: "&cPlease wait {seconds} seconds before logging out.".into(),
            reminder: "&eUse /login <password> to authenticate".into(),
            reminder_new: "&eUse /register <password> <password> to create an account".into(),
            blocked: "&cYou must authenticate first!".into(),
            internal_error: "&cSomething went wrong. Please try again.".into(),
            title_login: "&eUse /login".into(),
            subtitle_login: "&7Enter your password".into(),
            title_register: "&eUse /register".into(),
            subtitle_register: "&7Create your password".into(),
            admin_not_registered: "&c{player} is not registered.".into(),
        }
    }
}
