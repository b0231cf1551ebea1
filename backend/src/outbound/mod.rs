//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits for various infrastructure concerns:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **google_books**: the Google Books volumes API behind `BookCatalogue`
//! - **llm**: OpenAI-compatible chat completions behind `ChatModel`
//! - **password**: Argon2id hashing behind `PasswordHasher`
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod google_books;
pub mod llm;
pub mod password;
pub mod persistence;
