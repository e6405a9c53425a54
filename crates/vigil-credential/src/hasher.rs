//! The Argon2id hasher.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::CredentialError;

/// Default time cost (Argon2 iterations). With the default 19 MiB memory
/// cost this lands around 200–500 ms per hash on commodity server hardware,
/// which is the sweet spot for login credentials: painful to brute-force,
/// unnoticeable on a single interactive attempt.
pub const DEFAULT_COST: u32 = 6;

/// Upper bound on the configurable time cost. Above this a single login
/// stalls long enough to look like an outage.
pub const MAX_COST: u32 = 64;

/// Memory cost in KiB (19 MiB, the Argon2id default recommendation).
const MEMORY_KIB: u32 = 19 * 1024;

/// One-way credential hashing with a configurable time cost.
///
/// Stateless apart from the parameters; cheap to construct, `Send + Sync`,
/// safe to call from any thread.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Creates a hasher with the given time cost, clamped to
    /// `1..=`[`MAX_COST`].
    pub fn new(cost: u32) -> Self {
        let cost = cost.clamp(1, MAX_COST);
        // Params::new only rejects out-of-range values, which the clamp
        // above already excludes.
        let params = Params::new(MEMORY_KIB, cost, 1, None)
            .expect("clamped Argon2 params are always valid");
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes a plaintext password into a PHC string.
    ///
    /// A fresh random salt is generated per call, so hashing the same
    /// plaintext twice never yields the same string.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hash(e.to_string()))
    }

    /// Verifies a plaintext password against a stored PHC string.
    ///
    /// Recomputes with the salt and parameters embedded in the string and
    /// compares in constant time. Returns `false` for malformed strings —
    /// a corrupted record must read as "wrong password", not crash a login.
    pub fn verify(&self, plaintext: &str, phc: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(phc) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
