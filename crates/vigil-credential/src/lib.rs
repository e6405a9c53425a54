//! Password hashing and verification for Vigil.
//!
//! A deliberately thin crate: one type, two operations. Credentials are
//! hashed with Argon2id into PHC strings (`$argon2id$v=19$m=...,t=...,p=...$
//! salt$hash`), so every hash is self-describing — the salt and cost travel
//! with it, and verification never needs this crate's configuration to
//! match the configuration that produced the hash.
//!
//! Hashing is slow **on purpose** (hundreds of milliseconds). Callers must
//! never hold a lock across [`CredentialHasher::hash`] or
//! [`CredentialHasher::verify`].

mod error;
mod hasher;

pub use error::CredentialError;
pub use hasher::{CredentialHasher, DEFAULT_COST, MAX_COST};
