//! Error type for credential operations.

/// Errors from credential hashing.
///
/// Note the asymmetry: [`hash`](crate::CredentialHasher::hash) can fail
/// (salt generation, parameter rejection), but
/// [`verify`](crate::CredentialHasher::verify) cannot — a malformed stored
/// hash simply verifies as `false`, because from the caller's point of view
/// "the password does not match the record" is the only fact that matters.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The underlying hash computation failed.
    ///
    /// Carried as a string because `argon2`'s error type does not implement
    /// `std::error::Error`.
    #[error("password hashing failed: {0}")]
    Hash(String),
}
