//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature. The
//! in-memory repositories honour the same ordering, ownership, and
//! uniqueness rules as the Diesel adapters so service and HTTP tests can
//! run without PostgreSQL.

mod clock;
mod memory;

pub use clock::MutableClock;
pub use memory::{
    InMemoryConversationRepository, InMemoryReadingListRepository,
    InMemoryRecommendationRepository, InMemoryUserRepository, PlaintextPasswordHasher,
};
