//! The account store: in-memory map + crash-safe JSON persistence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info, warn};
use vigil_types::PlayerId;

use crate::{Account, StoreError};

/// File names under the storage directory.
const DATA_FILE: &str = "accounts.json";
const TEMP_FILE: &str = "accounts.json.tmp";
const BACKUP_FILE: &str = "accounts.json.bak";

/// Durable mapping from player identity to [`Account`].
///
/// All reads are served from memory; every mutating call persists the full
/// map synchronously before returning, so a positively-acknowledged
/// registration or password change is on disk by the time the caller sees
/// it. The mutex is held across the write on purpose: saves must hit the
/// disk in the same order the map changed, or a racing pair of mutations
/// could leave the file missing the earlier one.
pub struct AccountStore {
    data_path: PathBuf,
    temp_path: PathBuf,
    backup_path: PathBuf,
    accounts: Mutex<HashMap<PlayerId, Account>>,
}

impl AccountStore {
    /// Creates a store rooted at `dir`. Nothing is read until
    /// [`load`](Self::load); nothing is written until the first mutation.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_path: dir.join(DATA_FILE),
            temp_path: dir.join(TEMP_FILE),
            backup_path: dir.join(BACKUP_FILE),
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the account file into memory. Call once at startup.
    ///
    /// A missing file is a fresh server, not an error. An unreadable file
    /// is logged and leaves the store empty (the backup file is untouched
    /// for operators to recover from). Individual records that fail to
    /// parse are skipped so one corrupted entry can't take down every
    /// account.
    pub fn load(&self) {
        if !self.data_path.exists() {
            info!(path = %self.data_path.display(), "no account file, starting fresh");
            return;
        }

        let raw = match fs::read_to_string(&self.data_path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %self.data_path.display(), error = %e, "failed to read account file");
                return;
            }
        };

        // Parse the outer object first, then each record on its own, so a
        // single bad record is skipped instead of poisoning the whole load.
        let values: HashMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                error!(path = %self.data_path.display(), error = %e, "account file is not valid JSON");
                return;
            }
        };

        let mut accounts = self.accounts.lock().expect("store mutex poisoned");
        accounts.clear();
        let mut skipped = 0usize;
        for (key, value) in values {
            match serde_json::from_value::<Account>(value) {
                Ok(account) => {
                    accounts.insert(account.id, account);
                }
                Err(e) => {
                    skipped += 1;
                    error!(record = %key, error = %e, "skipping unreadable account record");
                }
            }
        }

        info!(loaded = accounts.len(), skipped, "account store loaded");
    }

    /// `true` if an account exists for `id`.
    pub fn is_registered(&self, id: PlayerId) -> bool {
        self.accounts
            .lock()
            .expect("store mutex poisoned")
            .contains_key(&id)
    }

    /// A copy of the account for `id`, if registered. Callers mutate the
    /// copy and write it back through [`update`](Self::update); the store
    /// keeps exclusive ownership of the canonical record.
    pub fn account(&self, id: PlayerId) -> Option<Account> {
        self.accounts
            .lock()
            .expect("store mutex poisoned")
            .get(&id)
            .cloned()
    }

    /// Inserts a new account and persists, unless `id` is already taken.
    ///
    /// The existence check and the insert happen under one lock, so of N
    /// concurrent registrations for the same id exactly one returns `true`
    /// and the rest return `false` without touching state.
    pub fn register(&self, account: Account) -> bool {
        let mut accounts = self.accounts.lock().expect("store mutex poisoned");
        if accounts.contains_key(&account.id) {
            return false;
        }
        let id = account.id;
        accounts.insert(id, account);
        self.persist_or_log(&accounts);
        info!(player_id = %id, total = accounts.len(), "account registered");
        true
    }

    /// Upserts an account and persists.
    pub fn update(&self, account: Account) {
        let mut accounts = self.accounts.lock().expect("store mutex poisoned");
        accounts.insert(account.id, account);
        self.persist_or_log(&accounts);
    }

    /// Deletes the account for `id` and persists. Returns whether a
    /// deletion actually happened; no file write occurs on a miss.
    pub fn remove(&self, id: PlayerId) -> bool {
        let mut accounts = self.accounts.lock().expect("store mutex poisoned");
        if accounts.remove(&id).is_none() {
            return false;
        }
        self.persist_or_log(&accounts);
        info!(player_id = %id, "account removed");
        true
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of every account, for admin listings.
    pub fn all(&self) -> Vec<Account> {
        self.accounts
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Persists the current map explicitly, surfacing the error. The
    /// mutating calls do this implicitly (and log instead); `flush` exists
    /// for hosts that want a save-on-shutdown hook with a visible result.
    pub fn flush(&self) -> Result<(), StoreError> {
        let accounts = self.accounts.lock().expect("store mutex poisoned");
        self.persist(&accounts)
    }

    fn persist_or_log(&self, accounts: &HashMap<PlayerId, Account>) {
        if let Err(e) = self.persist(accounts) {
            // The in-memory map stays authoritative; the next successful
            // save reconciles the file.
            error!(path = %self.data_path.display(), error = %e, "failed to save accounts");
        }
    }

    /// The write protocol: temp file → best-effort backup → atomic rename.
    ///
    /// `rename` over the live file is the atomicity point. A crash before
    /// it leaves the old file intact; a crash after it leaves the new file
    /// complete. The backup copy is advisory and its failure only warns.
    fn persist(&self, accounts: &HashMap<PlayerId, Account>) -> Result<(), StoreError> {
        if let Some(parent) = self.data_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(accounts)?;
        fs::write(&self.temp_path, json)?;

        if self.data_path.exists() {
            if let Err(e) = fs::copy(&self.data_path, &self.backup_path) {
                warn!(error = %e, "could not refresh account backup file");
            }
        }

        fs::rename(&self.temp_path, &self.data_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: PlayerId) -> Account {
        Account::new(id, "steve", "$argon2id$hash", "127.0.0.1", 1000)
    }

    /// In-memory-ish store: points at a directory that's never created
    /// because these tests only exercise the map logic. Persistence runs
    /// against real temp directories in `tests/persistence.rs`.
    fn scratch_store(name: &str) -> AccountStore {
        let dir = std::env::temp_dir()
            .join("vigil-store-unit")
            .join(format!("{name}-{}", std::process::id()));
        AccountStore::open(dir)
    }

    #[test]
    fn test_register_new_id_succeeds() {
        let store = scratch_store("register");
        let id = PlayerId::random();
        assert!(store.register(account(id)));
        assert!(store.is_registered(id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_duplicate_id_rejected_without_mutation() {
        let store = scratch_store("register-dup");
        let id = PlayerId::random();
        let mut first = account(id);
        first.display_name = "original".into();
        assert!(store.register(first));

        let mut second = account(id);
        second.display_name = "impostor".into();
        assert!(!store.register(second));

        assert_eq!(store.account(id).unwrap().display_name, "original");
    }

    #[test]
    fn test_account_returns_copy() {
        let store = scratch_store("copy");
        let id = PlayerId::random();
        store.register(account(id));

        let mut copy = store.account(id).unwrap();
        copy.display_name = "mutated copy".into();
        // The canonical record is untouched until update() writes it back.
        assert_eq!(store.account(id).unwrap().display_name, "steve");
    }

    #[test]
    fn test_update_upserts() {
        let store = scratch_store("update");
        let id = PlayerId::random();
        store.register(account(id));

        let mut acc = store.account(id).unwrap();
        acc.record_login("8.8.8.8", 2000);
        store.update(acc);

        let stored = store.account(id).unwrap();
        assert_eq!(stored.login_count, 2);
        assert_eq!(stored.last_ip, "8.8.8.8");
    }

    #[test]
    fn test_remove_reports_hit_or_miss() {
        let store = scratch_store("remove");
        let id = PlayerId::random();
        store.register(account(id));

        assert!(store.remove(id));
        assert!(!store.is_registered(id));
        assert!(!store.remove(id));
    }

    #[test]
    fn test_concurrent_register_same_id_single_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(scratch_store("race"));
        let id = PlayerId::random();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || store.register(account(id))));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();

        assert_eq!(wins, 1, "exactly one concurrent registration may win");
        assert_eq!(store.len(), 1);
    }
}
