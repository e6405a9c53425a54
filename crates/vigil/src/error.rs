//! Unified error type for the Vigil meta-crate.

use vigil_credential::CredentialError;
use vigil_store::StoreError;

/// Top-level error wrapping the sub-crate errors.
///
/// Note how little there is here: the engine reports rejections (wrong
/// password, rate limited, cooldown) as outcome values, not errors, and
/// absorbs I/O failures internally. What remains is the handful of
/// operations a host may call directly that can genuinely fail, like
/// [`AccountStore::flush`](vigil_store::AccountStore::flush).
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// A credential-hashing failure.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A store persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
