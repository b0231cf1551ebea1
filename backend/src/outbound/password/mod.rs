//! Password hashing adapters.
//!
//! Provides the Argon2id implementation of the `PasswordHasher` port.

mod argon2_hasher;

pub use argon2_hasher::Argon2PasswordHasher;
