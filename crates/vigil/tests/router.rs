//! Integration tests for the host-facing surface: event router wiring
//! and the bundled tick driver.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil::prelude::*;

// =========================================================================
// Test double
// =========================================================================

struct TestPlayer {
    id: PlayerId,
    name: String,
    fake: bool,
    position: Mutex<Position>,
    chat: Mutex<Vec<String>>,
    kicked: Mutex<Option<String>>,
}

impl TestPlayer {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            id: PlayerId::random(),
            name: name.to_string(),
            fake: false,
            position: Mutex::new(Position::new(0.0, 64.0, 0.0, "overworld")),
            chat: Mutex::new(Vec::new()),
            kicked: Mutex::new(None),
        })
    }

    fn fake(name: &str) -> Arc<Self> {
        let mut p = Self::new(name);
        Arc::get_mut(&mut p).unwrap().fake = true;
        p
    }
}

impl Player for TestPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }
    fn name(&self) -> String {
        self.name.clone()
    }
    fn ip(&self) -> String {
        "198.51.100.2".to_string()
    }
    fn is_fake(&self) -> bool {
        self.fake
    }
    fn position(&self) -> Position {
        self.position.lock().unwrap().clone()
    }
    fn teleport(&self, pos: &Position) {
        *self.position.lock().unwrap() = pos.clone();
    }
    fn halt_momentum(&self) {}
    fn send_chat(&self, message: &str) {
        self.chat.lock().unwrap().push(message.to_string());
    }
    fn send_title(&self, _title: &str, _subtitle: &str) {}
    fn clear_title(&self) {}
    fn send_action_bar(&self, _message: &str) {}
    fn play_sound(&self, _sound_id: &str) {}
    fn kick(&self, reason: &str) {
        *self.kicked.lock().unwrap() = Some(reason.to_string());
    }
}

// =========================================================================
// Setup
// =========================================================================

static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

fn temp_dir(name: &str) -> PathBuf {
    let seq = DIR_SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "vigil-router-it-{}-{name}-{seq}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn router(name: &str, config: AuthConfig) -> Arc<EventRouter<TestPlayer>> {
    let store = Arc::new(AccountStore::open(temp_dir(name)));
    store.load();
    let manager = Arc::new(AuthManager::new(config, store));
    Arc::new(EventRouter::new(manager))
}

fn fast_config() -> AuthConfig {
    AuthConfig {
        hash_cost: 1,
        ..AuthConfig::default()
    }
}

// =========================================================================
// Event routing
// =========================================================================

#[test]
fn test_unauthenticated_player_is_gated_everywhere() {
    let router = router("gated", fast_config());
    let p = TestPlayer::new("steve");
    router.player_joined(&p);

    assert!(!router.allow_action(&p));
    assert!(!router.allow_chat(&p));
    assert!(!router.allow_damage_received(&p));
    assert!(!router.allow_damage_dealt(&p));
    assert!(!router.allow_command(&p, "/home"));

    // The way out of limbo stays open.
    assert!(router.allow_command(&p, "/login hunter2"));
    assert!(router.allow_command(&p, "/register pw pw"));
}

#[test]
fn test_authentication_opens_the_gates() {
    let router = router("opened", fast_config());
    let p = TestPlayer::new("steve");
    router.player_joined(&p);

    assert_eq!(
        router.manager().attempt_register(&p, "hunter2", "hunter2"),
        RegisterOutcome::Success
    );

    assert!(router.allow_action(&p));
    assert!(router.allow_chat(&p));
    assert!(router.allow_command(&p, "/home"));
    assert!(router.allow_damage_dealt(&p));
    // Damage received is still suppressed by post-login invincibility.
    assert!(!router.allow_damage_received(&p));
}

#[test]
fn test_denied_chat_and_command_notify_once_each() {
    let router = router("notices", fast_config());
    let p = TestPlayer::new("steve");
    router.player_joined(&p);
    let before = p.chat.lock().unwrap().len();

    router.allow_chat(&p);
    router.allow_command(&p, "/home");

    let lines = p.chat.lock().unwrap();
    assert_eq!(lines.len(), before + 2);
    assert!(lines[before].contains("authenticate first"));
}

#[test]
fn test_chat_blocking_toggle() {
    let cfg = AuthConfig {
        block_chat: false,
        ..fast_config()
    };
    let router = router("chat-open", cfg);
    let p = TestPlayer::new("steve");
    router.player_joined(&p);

    assert!(router.allow_chat(&p), "chat passes when the toggle is off");
    assert!(!router.allow_action(&p), "other gates are unaffected");
}

#[test]
fn test_fake_players_pass_every_gate() {
    let router = router("fake", fast_config());
    let bot = TestPlayer::fake("surveyor_bot");
    router.player_joined(&bot);

    assert!(router.allow_action(&bot));
    assert!(router.allow_chat(&bot));
    assert!(router.allow_command(&bot, "/anything"));
    assert!(router.allow_damage_received(&bot));
    assert!(router.allow_damage_dealt(&bot));
}

#[test]
fn test_leave_then_rejoin_requires_reauthentication() {
    let router = router("rejoin", fast_config());
    let p = TestPlayer::new("steve");
    router.player_joined(&p);
    router.manager().attempt_register(&p, "hunter2", "hunter2");
    assert!(router.allow_action(&p));

    router.player_left(&p);
    router.player_joined(&p);

    assert!(!router.allow_action(&p));
    assert_eq!(
        router.manager().attempt_login(&p, "hunter2"),
        LoginOutcome::Success
    );
    assert!(router.allow_action(&p));
}

// =========================================================================
// Tick driver
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_tick_driver_runs_at_the_configured_period() {
    // Log output for debugging flaky timer behavior; ignored unless the
    // test binary runs with RUST_LOG set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let router = router("driver", fast_config());
    let driver = TickDriver::spawn(Arc::clone(&router), Duration::from_millis(50));

    // Paused clock: this sleep auto-advances time, firing the interval
    // as it goes. One immediate tick plus ~20 over the simulated second.
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let ticks = router.manager().tick_count();
    assert!(
        (15..=25).contains(&(ticks as i64)),
        "expected ~21 ticks, got {ticks}"
    );

    driver.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_tick_driver_shutdown_stops_the_loop() {
    let router = router("driver-stop", fast_config());
    let driver = TickDriver::spawn(Arc::clone(&router), Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(200)).await;
    driver.shutdown().await;
    let after_stop = router.manager().tick_count();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(router.manager().tick_count(), after_stop);
}
