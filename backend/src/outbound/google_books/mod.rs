//! Google Books outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `BookCatalogue`
//! port over the public volumes API.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_GOOGLE_BOOKS_BASE_URL, GoogleBooksHttpSource, GoogleBooksSettings};
