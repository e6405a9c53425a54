//! The session manager: orchestrates every authentication transition.
//!
//! One `AuthManager` exists per server, constructed at startup and handed
//! by reference to every collaborator that needs it (event adapters, the
//! tick driver, command handlers). It owns the in-memory session map and
//! coordinates the three leaf components: credential hashing, rate
//! limiting, and the durable account store.
//!
//! # Locking discipline
//!
//! Each component guards its own state; there is no lock shared across
//! components. The sessions mutex protects only the session map, and is
//! never held across a call into the hasher (slow by design), the store
//! (does disk I/O), or any host [`Player`] method other than trivial
//! getters. Flows read under the lock, decide, release, then act.
//!
//! The price of that discipline is benign races: an admin `force_login`
//! can beat a player's own in-flight login, the tick loop can kick a
//! player mid-command. Every operation therefore re-checks state at its
//! single mutation point — the guarantee is "no double-credit", not
//! strict ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use vigil_credential::CredentialHasher;
use vigil_ratelimit::RateLimiter;
use vigil_store::{Account, AccountStore, unix_millis};
use vigil_types::{Player, PlayerId, Position};

use crate::config::AuthConfig;
use crate::messages::render;
use crate::session::Session;

/// Horizontal drift (blocks) tolerated before re-snapping a player to the
/// holding location.
const HOLDING_TOLERANCE: f64 = 1.5;

/// Any-axis drift tolerated before a frozen-in-place player is teleported
/// back to their join spot.
const FREEZE_TOLERANCE: f64 = 0.1;

/// Rate-limiter expiry sweep cadence, in ticks. At the common 20 Hz tick
/// rate this is every 30 seconds; the exact cadence only bounds memory,
/// reads expire lazily regardless.
const CLEANUP_EVERY_TICKS: u64 = 600;

/// Result of a login attempt. Rejections carry the user-facing detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// Wrong password; this many attempts remain before lockout (the
    /// minimum across the origin and identity keys).
    WrongPassword { attempts_remaining: u32 },
    NotRegistered,
    /// Also returned for the benign race where the session vanished or
    /// authenticated concurrently mid-attempt: nothing was changed.
    AlreadyLoggedIn,
    /// Locked out; retry after this many minutes (rounded up).
    RateLimited { minutes: u64 },
}

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Success,
    AlreadyRegistered,
    PasswordMismatch,
    PasswordTooShort { min: usize },
    AlreadyLoggedIn,
    /// The hashing backend failed (logged); nothing was created.
    Internal,
}

/// Result of a password change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePasswordOutcome {
    Success,
    WrongOldPassword,
    PasswordMismatch,
    PasswordTooShort { min: usize },
    NotLoggedIn,
    NotRegistered,
    /// The hashing backend failed (logged); the stored hash is unchanged.
    Internal,
}

/// Result of a voluntary logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    NotAuthenticated,
    /// Logout is switched off in the config.
    Disabled,
    /// Still inside the cooldown from the previous logout.
    CooldownActive { seconds_remaining: u64 },
}

/// What happened at the single authenticated-flag mutation point.
enum AuthTransition {
    /// Freshly authenticated; restore this position if any.
    Done { restore: Option<Position> },
    /// Someone (admin, concurrent attempt) got there first.
    AlreadyAuthenticated,
    /// No session for this player (disconnected mid-flow, or a fake
    /// player that was never tracked).
    NoSession,
}

struct SessionEntry<P> {
    player: Arc<P>,
    session: Session,
}

/// The authentication session manager.
///
/// Generic over the host's player handle so the engine can drive
/// teleports, notices, and kicks without knowing anything about the host
/// runtime.
pub struct AuthManager<P: Player> {
    config: RwLock<Arc<AuthConfig>>,
    store: Arc<AccountStore>,
    /// Behind its own `RwLock` only so a config reload can swap in a
    /// limiter with the new window parameters; operations take the read
    /// side and the limiter synchronizes internally.
    limiter: RwLock<RateLimiter>,
    sessions: Mutex<HashMap<PlayerId, SessionEntry<P>>>,
    ticks: AtomicU64,
    /// Count of hash *creations* (registration, password change), for
    /// health reporting and for tests asserting that validation happens
    /// before the expensive part.
    hashes: AtomicU64,
}

impl<P: Player> AuthManager<P> {
    pub fn new(config: AuthConfig, store: Arc<AccountStore>) -> Self {
        let config = config.validated();
        let limiter = Self::build_limiter(&config);
        Self {
            config: RwLock::new(Arc::new(config)),
            store,
            limiter: RwLock::new(limiter),
            sessions: Mutex::new(HashMap::new()),
            ticks: AtomicU64::new(0),
            hashes: AtomicU64::new(0),
        }
    }

    fn build_limiter(config: &AuthConfig) -> RateLimiter {
        RateLimiter::new(
            config.max_attempts,
            Duration::from_secs(config.attempt_window_mins * 60),
            Duration::from_secs(config.lockout_mins * 60),
        )
    }

    /// The active configuration. Cheap (an `Arc` clone); callers should
    /// grab it once per operation so one flow sees one config even across
    /// a concurrent reload.
    pub fn config(&self) -> Arc<AuthConfig> {
        Arc::clone(&self.config.read().expect("config lock poisoned"))
    }

    /// Swaps in a new configuration. The rate limiter is rebuilt with the
    /// new window parameters, which drops in-flight failure windows —
    /// reloads are rare, operator-driven events and a clean slate beats
    /// windows counted under two different rule sets.
    pub fn reload_config(&self, new: AuthConfig) {
        let new = new.validated();
        let limiter = Self::build_limiter(&new);
        *self.limiter.write().expect("limiter lock poisoned") = limiter;
        *self.config.write().expect("config lock poisoned") = Arc::new(new);
        info!("auth configuration reloaded");
    }

    // -- State queries ----------------------------------------------------

    /// Whether this player has authenticated in the current session.
    pub fn is_authenticated(&self, id: PlayerId) -> bool {
        self.sessions
            .lock()
            .expect("sessions lock poisoned")
            .get(&id)
            .is_some_and(|e| e.session.authenticated)
    }

    /// Whether this player is inside the post-login invincibility window.
    pub fn is_invincible(&self, id: PlayerId) -> bool {
        self.is_invincible_at(id, Instant::now())
    }

    /// Clock-explicit form of [`is_invincible`](Self::is_invincible).
    /// Lazily clears the window once it has expired.
    pub fn is_invincible_at(&self, id: PlayerId, now: Instant) -> bool {
        let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
        let Some(entry) = sessions.get_mut(&id) else {
            return false;
        };
        match entry.session.invincible_until {
            Some(until) if now < until => true,
            Some(_) => {
                entry.session.invincible_until = None;
                false
            }
            None => false,
        }
    }

    /// Whether protective blocking applies to this player's actions.
    /// Always `false` for fake players; otherwise the negation of
    /// [`is_authenticated`](Self::is_authenticated).
    pub fn should_block(&self, player: &P) -> bool {
        if player.is_fake() {
            return false;
        }
        !self.is_authenticated(player.id())
    }

    /// Whether an account exists for this player.
    pub fn is_registered(&self, id: PlayerId) -> bool {
        self.store.is_registered(id)
    }

    /// Human sessions currently connected (any auth state).
    pub fn online_count(&self) -> usize {
        self.sessions.lock().expect("sessions lock poisoned").len()
    }

    /// Registered accounts on record, for admin status output.
    pub fn account_count(&self) -> usize {
        self.store.len()
    }

    /// Total hash computations performed since startup.
    pub fn hashes_computed(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Sends the "you must authenticate first" notice. Event adapters
    /// call this when they swallow a chat line or command so the player
    /// learns why nothing happened.
    pub fn notify_blocked(&self, player: &P) {
        let cfg = self.config();
        self.notice(player, &cfg.messages.blocked, &[]);
    }

    // -- Join / leave -----------------------------------------------------

    /// Tracks a newly-connected player and puts them into the
    /// unauthenticated holding state. Fake players are ignored entirely.
    pub fn on_join(&self, player: &Arc<P>) {
        if player.is_fake() {
            return;
        }

        let cfg = self.config();
        let id = player.id();
        let joined_pos = player.position();

        {
            let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
            // A duplicate join (host hiccup) replaces the old session:
            // the fresh connection starts unauthenticated like any other.
            sessions.insert(
                id,
                SessionEntry {
                    player: Arc::clone(player),
                    session: Session::new(Instant::now(), joined_pos),
                },
            );
        }

        if let Some(holding) = &cfg.holding {
            player.teleport(&holding.position());
        }

        let registered = self.store.is_registered(id);
        let m = &cfg.messages;
        let (welcome, title, subtitle) = if registered {
            (&m.welcome, &m.title_login, &m.subtitle_login)
        } else {
            (&m.welcome_first_time, &m.title_register, &m.subtitle_register)
        };
        self.notice(player, welcome, &[]);
        player.send_title(
            &self.render_for(player, title, &[]),
            &self.render_for(player, subtitle, &[]),
        );

        info!(player = %player.name(), %id, registered, "player joined, awaiting authentication");
    }

    /// Discards all session state for a departing player, whatever state
    /// they were in. Safe to call for unknown players.
    pub fn on_leave(&self, player: &P) {
        let removed = self
            .sessions
            .lock()
            .expect("sessions lock poisoned")
            .remove(&player.id());
        if removed.is_some() {
            debug!(player = %player.name(), "session discarded on leave");
        }
    }

    // -- Login ------------------------------------------------------------

    /// Verifies a password and, on success, authenticates the session.
    ///
    /// Check order: already-authenticated short-circuit, registration,
    /// rate limit (both keys, larger lockout wins), then the hash
    /// verification last — it's the expensive step and the only one worth
    /// charging the limiter for.
    pub fn attempt_login(&self, player: &Arc<P>, password: &str) -> LoginOutcome {
        let cfg = self.config();
        let id = player.id();
        let now = Instant::now();

        if self.is_authenticated(id) {
            self.notice(player, &cfg.messages.already_logged_in, &[]);
            return LoginOutcome::AlreadyLoggedIn;
        }

        if !self.store.is_registered(id) {
            self.notice(player, &cfg.messages.not_registered, &[]);
            return LoginOutcome::NotRegistered;
        }

        let id_key = format!("id:{id}");
        let ip_key = cfg
            .ip_rate_limiting
            .then(|| format!("ip:{}", player.ip()));

        let locked = {
            let limiter = self.limiter.read().expect("limiter lock poisoned");
            let id_locked = limiter.locked_remaining(&id_key, now);
            let ip_locked = ip_key
                .as_deref()
                .map(|k| limiter.locked_remaining(k, now))
                .unwrap_or(Duration::ZERO);
            id_locked.max(ip_locked)
        };
        if locked > Duration::ZERO {
            let minutes = minutes_ceil(locked);
            self.notice(
                player,
                &cfg.messages.rate_limited,
                &[("minutes", &minutes.to_string())],
            );
            return LoginOutcome::RateLimited { minutes };
        }

        let Some(mut account) = self.store.account(id) else {
            // Registered a moment ago, purged since: treat as unregistered.
            self.notice(player, &cfg.messages.not_registered, &[]);
            return LoginOutcome::NotRegistered;
        };

        // The slow part. No locks held.
        if self.hasher(&cfg).verify(password, &account.password_hash) {
            match self.mark_authenticated(id, Instant::now()) {
                AuthTransition::NoSession => {
                    debug!(%id, "session vanished mid-login, nothing changed");
                    LoginOutcome::AlreadyLoggedIn
                }
                AuthTransition::AlreadyAuthenticated => {
                    // An admin force-login won the race; don't credit the
                    // account a second time.
                    self.notice(player, &cfg.messages.already_logged_in, &[]);
                    LoginOutcome::AlreadyLoggedIn
                }
                AuthTransition::Done { restore } => {
                    let ip = player.ip();
                    account.record_login(ip.clone(), unix_millis());
                    self.store.update(account);

                    {
                        let limiter = self.limiter.read().expect("limiter lock poisoned");
                        limiter.clear(&id_key);
                        if let Some(k) = &ip_key {
                            limiter.clear(k);
                        }
                    }

                    self.finish_authentication(player, restore);
                    self.notice(player, &cfg.messages.login_success, &[]);
                    player.play_sound(&cfg.sound_login_success);
                    info!(player = %player.name(), %id, ip, "logged in");
                    LoginOutcome::Success
                }
            }
        } else {
            let (remaining, now_locked) = {
                let limiter = self.limiter.read().expect("limiter lock poisoned");
                let id_res = limiter.record_failure(&id_key, now);
                let remaining = match &ip_key {
                    Some(k) => limiter.record_failure(k, now).remaining().min(id_res.remaining()),
                    None => id_res.remaining(),
                };
                (remaining, remaining == 0)
            };

            if now_locked {
                let minutes = cfg.lockout_mins.max(1);
                self.notice(
                    player,
                    &cfg.messages.rate_limited,
                    &[("minutes", &minutes.to_string())],
                );
                player.play_sound(&cfg.sound_login_fail);
                warn!(player = %player.name(), %id, "locked out after repeated failures");
                LoginOutcome::RateLimited { minutes }
            } else {
                self.notice(
                    player,
                    &cfg.messages.wrong_password,
                    &[("attempts", &remaining.to_string())],
                );
                player.play_sound(&cfg.sound_login_fail);
                LoginOutcome::WrongPassword {
                    attempts_remaining: remaining,
                }
            }
        }
    }

    // -- Register ---------------------------------------------------------

    /// Creates an account and authenticates in one step.
    ///
    /// Validation (confirmation match, minimum length) runs before any
    /// hash computation: rejecting bad input must stay cheap.
    pub fn attempt_register(
        &self,
        player: &Arc<P>,
        password: &str,
        confirm: &str,
    ) -> RegisterOutcome {
        let cfg = self.config();
        let id = player.id();

        if self.is_authenticated(id) {
            self.notice(player, &cfg.messages.already_logged_in, &[]);
            return RegisterOutcome::AlreadyLoggedIn;
        }

        if self.store.is_registered(id) {
            self.notice(player, &cfg.messages.already_registered, &[]);
            return RegisterOutcome::AlreadyRegistered;
        }

        if password != confirm {
            self.notice(player, &cfg.messages.password_mismatch, &[]);
            return RegisterOutcome::PasswordMismatch;
        }

        let min = cfg.min_password_len;
        if password.chars().count() < min {
            self.notice(player, &cfg.messages.password_too_short, &[("min", &min.to_string())]);
            return RegisterOutcome::PasswordTooShort { min };
        }

        let hash = match self.hash(&cfg, password) {
            Ok(hash) => hash,
            Err(e) => {
                error!(%id, error = %e, "hashing failed during registration");
                self.notice(player, &cfg.messages.internal_error, &[]);
                return RegisterOutcome::Internal;
            }
        };

        let ip = player.ip();
        let account = Account::new(id, player.name(), hash, ip.clone(), unix_millis());
        if !self.store.register(account) {
            // Lost a race with a concurrent registration for the same id.
            self.notice(player, &cfg.messages.already_registered, &[]);
            return RegisterOutcome::AlreadyRegistered;
        }

        match self.mark_authenticated(id, Instant::now()) {
            AuthTransition::Done { restore } => {
                self.finish_authentication(player, restore);
            }
            // Forced in concurrently, or disconnected right after the
            // store write. The account exists either way; report success.
            AuthTransition::AlreadyAuthenticated | AuthTransition::NoSession => {}
        }
        self.notice(player, &cfg.messages.register_success, &[]);
        player.play_sound(&cfg.sound_login_success);
        info!(player = %player.name(), %id, ip, "registered and logged in");
        RegisterOutcome::Success
    }

    // -- Change password --------------------------------------------------

    /// Replaces the password of a currently-authenticated player after
    /// verifying the old one.
    pub fn change_password(
        &self,
        player: &Arc<P>,
        old: &str,
        new: &str,
        confirm_new: &str,
    ) -> ChangePasswordOutcome {
        let cfg = self.config();
        let id = player.id();

        if !self.is_authenticated(id) {
            self.notice(player, &cfg.messages.blocked, &[]);
            return ChangePasswordOutcome::NotLoggedIn;
        }

        let Some(mut account) = self.store.account(id) else {
            self.notice(player, &cfg.messages.not_registered, &[]);
            return ChangePasswordOutcome::NotRegistered;
        };

        if !self.hasher(&cfg).verify(old, &account.password_hash) {
            self.notice(player, &cfg.messages.wrong_old_password, &[]);
            return ChangePasswordOutcome::WrongOldPassword;
        }

        if new != confirm_new {
            self.notice(player, &cfg.messages.password_mismatch, &[]);
            return ChangePasswordOutcome::PasswordMismatch;
        }

        let min = cfg.min_password_len;
        if new.chars().count() < min {
            self.notice(player, &cfg.messages.password_too_short, &[("min", &min.to_string())]);
            return ChangePasswordOutcome::PasswordTooShort { min };
        }

        match self.hash(&cfg, new) {
            Ok(hash) => {
                account.password_hash = hash;
                self.store.update(account);
                self.notice(player, &cfg.messages.password_changed, &[]);
                info!(player = %player.name(), %id, "password changed");
                ChangePasswordOutcome::Success
            }
            Err(e) => {
                error!(%id, error = %e, "hashing failed during password change");
                self.notice(player, &cfg.messages.internal_error, &[]);
                ChangePasswordOutcome::Internal
            }
        }
    }

    // -- Logout -----------------------------------------------------------

    /// Voluntarily drops back to the unauthenticated holding state.
    ///
    /// The cooldown is measured from the *previous logout*, so a player
    /// can't flicker between states; logging back in does not reset it.
    pub fn logout(&self, player: &Arc<P>) -> LogoutOutcome {
        let cfg = self.config();
        if !cfg.logout_enabled {
            return LogoutOutcome::Disabled;
        }

        let id = player.id();
        let now = Instant::now();
        // Captured before taking the lock; only used on the success path.
        let here = player.position();

        let outcome = {
            let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
            match sessions.get_mut(&id) {
                None => LogoutOutcome::NotAuthenticated,
                Some(entry) if !entry.session.authenticated => LogoutOutcome::NotAuthenticated,
                Some(entry) => match entry.session.cooldown_until {
                    Some(until) if now < until => LogoutOutcome::CooldownActive {
                        seconds_remaining: seconds_ceil(until - now),
                    },
                    _ => {
                        entry.session.authenticated = false;
                        entry.session.joined_at = now;
                        entry.session.last_reminder = None;
                        entry.session.saved_position = Some(here);
                        entry.session.invincible_until = None;
                        entry.session.cooldown_until =
                            Some(now + Duration::from_secs(cfg.logout_cooldown_secs));
                        LogoutOutcome::LoggedOut
                    }
                },
            }
        };

        match outcome {
            LogoutOutcome::LoggedOut => {
                if let Some(holding) = &cfg.holding {
                    player.teleport(&holding.position());
                }
                self.notice(player, &cfg.messages.logout_success, &[]);
                info!(player = %player.name(), %id, "logged out");
            }
            LogoutOutcome::CooldownActive { seconds_remaining } => {
                self.notice(
                    player,
                    &cfg.messages.logout_cooldown,
                    &[("seconds", &seconds_remaining.to_string())],
                );
            }
            LogoutOutcome::NotAuthenticated => {
                self.notice(player, &cfg.messages.blocked, &[]);
            }
            LogoutOutcome::Disabled => {}
        }
        outcome
    }

    // -- Administrative overrides -----------------------------------------

    /// Authenticates a player without credentials. Returns whether the
    /// session actually transitioned (false for untracked players and
    /// players already authenticated).
    pub fn force_login(&self, player: &Arc<P>) -> bool {
        match self.mark_authenticated(player.id(), Instant::now()) {
            AuthTransition::Done { restore } => {
                self.finish_authentication(player, restore);
                info!(player = %player.name(), "force-logged in");
                true
            }
            AuthTransition::AlreadyAuthenticated | AuthTransition::NoSession => false,
        }
    }

    /// Creates (or overwrites the password of) an account for `player`
    /// and authenticates them. Returns `false` only if hashing failed.
    pub fn force_register(&self, player: &Arc<P>, password: &str) -> bool {
        let cfg = self.config();
        let id = player.id();

        let hash = match self.hash(&cfg, password) {
            Ok(hash) => hash,
            Err(e) => {
                error!(%id, error = %e, "hashing failed during force-register");
                return false;
            }
        };

        match self.store.account(id) {
            Some(mut account) => {
                account.password_hash = hash;
                self.store.update(account);
            }
            None => {
                let account =
                    Account::new(id, player.name(), hash, player.ip(), unix_millis());
                self.store.register(account);
            }
        }

        if let AuthTransition::Done { restore } = self.mark_authenticated(id, Instant::now()) {
            self.finish_authentication(player, restore);
        }
        info!(player = %player.name(), %id, "force-registered");
        true
    }

    /// Deletes the account so the player must re-register. Their current
    /// session (if any) is untouched. Returns whether an account existed.
    pub fn reset_password(&self, id: PlayerId) -> bool {
        self.store.remove(id)
    }

    /// Deletes the account *and* de-authenticates any live session, which
    /// drops the player straight back into the holding state with fresh
    /// timers. Returns whether an account existed.
    pub fn purge_account(&self, id: PlayerId) -> bool {
        let player = {
            let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
            sessions.get_mut(&id).and_then(|entry| {
                if entry.session.authenticated {
                    entry.session.authenticated = false;
                    entry.session.joined_at = Instant::now();
                    entry.session.last_reminder = None;
                    entry.session.invincible_until = None;
                    Some(Arc::clone(&entry.player))
                } else {
                    None
                }
            })
        };

        // Re-capture a position to hold them at, outside the lock.
        if let Some(player) = player {
            let here = player.position();
            let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
            if let Some(entry) = sessions.get_mut(&id) {
                if entry.session.saved_position.is_none() {
                    entry.session.saved_position = Some(here);
                }
            }
        }

        self.store.remove(id)
    }

    // -- Tick -------------------------------------------------------------

    /// One pass of the periodic maintenance: timeout kicks, reminders,
    /// movement correction, limiter cleanup.
    ///
    /// Driven by the host's tick source (or the bundled driver) at any
    /// cadence; all timing is measured against `now`, so a slow tick only
    /// makes enforcement late, never wrong.
    pub fn on_tick(&self, now: Instant) {
        let cfg = self.config();
        let timeout = Duration::from_secs(cfg.login_timeout_secs);
        let reminder_every = Duration::from_secs(cfg.reminder_interval_secs);

        // Snapshot the unauthenticated sessions so kicks and concurrent
        // leaves can't invalidate iteration.
        let pending: Vec<(Arc<P>, Instant, Option<Instant>, Option<Position>)> = {
            let sessions = self.sessions.lock().expect("sessions lock poisoned");
            sessions
                .values()
                .filter(|e| !e.session.authenticated)
                .map(|e| {
                    (
                        Arc::clone(&e.player),
                        e.session.joined_at,
                        e.session.last_reminder,
                        e.session.saved_position.clone(),
                    )
                })
                .collect()
        };

        for (player, joined_at, last_reminder, saved) in pending {
            // (a) Timeout kick. The leave event that follows the kick
            // cleans the session up; nothing else runs for this player.
            if now.duration_since(joined_at) >= timeout {
                player.kick(&self.render_for(&player, &cfg.messages.kicked, &[]));
                info!(player = %player.name(), "kicked for login timeout");
                continue;
            }

            // (b) Reminder. Fires immediately on the first tick after
            // join, then every interval.
            let due = match last_reminder {
                None => true,
                Some(at) => now.duration_since(at) >= reminder_every,
            };
            if due {
                let template = if self.store.is_registered(player.id()) {
                    &cfg.messages.reminder
                } else {
                    &cfg.messages.reminder_new
                };
                player.send_action_bar(&self.render_for(&player, template, &[]));

                let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
                if let Some(entry) = sessions.get_mut(&player.id()) {
                    entry.session.last_reminder = Some(now);
                }
            }

            // (c) Movement correction.
            if cfg.block_movement {
                if let Some(holding) = &cfg.holding {
                    let target = holding.position();
                    if player.position().horizontal_drift(&target) > HOLDING_TOLERANCE {
                        player.teleport(&target);
                    }
                } else if let Some(spot) = &saved {
                    if player.position().drift(spot) > FREEZE_TOLERANCE {
                        // Exact spot and orientation, and kill whatever
                        // momentum carried them away.
                        player.teleport(spot);
                        player.halt_momentum();
                    }
                }
            }
        }

        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if tick % CLEANUP_EVERY_TICKS == 0 {
            self.limiter.read().expect("limiter lock poisoned").cleanup(now);
        }
    }

    /// Ticks processed since startup.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    // -- Internals --------------------------------------------------------

    /// The one place the `authenticated` flag flips to `true`.
    ///
    /// Everything that must be atomic with the flip happens here, under
    /// the sessions lock: clearing timers, taking the saved position,
    /// arming invincibility. Side effects on the player handle are left
    /// to the caller, outside the lock.
    fn mark_authenticated(&self, id: PlayerId, now: Instant) -> AuthTransition {
        let cfg = self.config();
        let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
        let Some(entry) = sessions.get_mut(&id) else {
            return AuthTransition::NoSession;
        };
        if entry.session.authenticated {
            return AuthTransition::AlreadyAuthenticated;
        }

        entry.session.authenticated = true;
        entry.session.last_reminder = None;
        let saved = entry.session.saved_position.take();
        if cfg.invincibility_secs > 0 {
            entry.session.invincible_until =
                Some(now + Duration::from_secs(cfg.invincibility_secs));
        }

        // Only restore when a holding teleport displaced the player;
        // frozen-in-place players are already standing there.
        let restore = cfg.holding.is_some().then_some(saved).flatten();
        AuthTransition::Done { restore }
    }

    /// Player-visible side effects of authenticating, outside any lock.
    fn finish_authentication(&self, player: &Arc<P>, restore: Option<Position>) {
        if let Some(pos) = restore {
            player.teleport(&pos);
        }
        player.clear_title();
    }

    fn hasher(&self, cfg: &AuthConfig) -> CredentialHasher {
        CredentialHasher::new(cfg.hash_cost)
    }

    fn hash(&self, cfg: &AuthConfig, plaintext: &str) -> Result<String, vigil_credential::CredentialError> {
        self.hashes.fetch_add(1, Ordering::Relaxed);
        self.hasher(cfg).hash(plaintext)
    }

    /// Renders a template with the standard placeholder set plus `extra`.
    fn render_for(&self, player: &P, template: &str, extra: &[(&str, &str)]) -> String {
        let cfg = self.config();
        let name = player.name();
        let online = self.online_count().to_string();
        let mut vars: Vec<(&str, &str)> = vec![
            ("player", name.as_str()),
            ("server", cfg.server_name.as_str()),
            ("online", online.as_str()),
        ];
        vars.extend_from_slice(extra);
        render(template, &vars)
    }

    /// Sends one chat notice to the player.
    fn notice(&self, player: &P, template: &str, extra: &[(&str, &str)]) {
        player.send_chat(&self.render_for(player, template, extra));
    }
}

/// Whole minutes, rounded up, never zero.
fn minutes_ceil(d: Duration) -> u64 {
    (d.as_secs().div_ceil(60)).max(1)
}

/// Whole seconds, rounded up, never zero.
fn seconds_ceil(d: Duration) -> u64 {
    ((d.as_millis() as u64).div_ceil(1000)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_ceil_rounds_up() {
        assert_eq!(minutes_ceil(Duration::from_secs(1)), 1);
        assert_eq!(minutes_ceil(Duration::from_secs(60)), 1);
        assert_eq!(minutes_ceil(Duration::from_secs(61)), 2);
        assert_eq!(minutes_ceil(Duration::from_millis(1)), 1);
    }

    #[test]
    fn test_seconds_ceil_rounds_up() {
        assert_eq!(seconds_ceil(Duration::from_millis(1)), 1);
        assert_eq!(seconds_ceil(Duration::from_millis(1000)), 1);
        assert_eq!(seconds_ceil(Duration::from_millis(1001)), 2);
    }
}
