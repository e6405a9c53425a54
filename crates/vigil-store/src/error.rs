//! Error type for store persistence.

/// Errors from reading or writing the account file.
///
/// These surface through [`AccountStore::flush`](crate::AccountStore::flush)
/// for hosts that want to save explicitly; the store's own mutating calls
/// log and absorb them instead, because a full disk must degrade the
/// server, not crash it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem trouble: create, write, rename.
    #[error("account store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The account map could not be serialized (should never happen with
    /// well-formed records) or the file on disk is not valid JSON.
    #[error("account data malformed: {0}")]
    Json(#[from] serde_json::Error),
}
