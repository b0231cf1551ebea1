//! Driven port for the external book catalogue.

use async_trait::async_trait;

use crate::domain::{BookDetails, BookId, BookSearchPage, BookSearchQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by book catalogue adapters.
    pub enum BookCatalogueError {
        /// The catalogue did not answer in time.
        Timeout { message: String } => "book catalogue request timed out: {message}",
        /// The catalogue throttled the request.
        RateLimited { message: String } => "book catalogue rate limited the request: {message}",
        /// The catalogue answered with an error status.
        Upstream { status: u16, message: String } =>
            "book catalogue returned status {status}: {message}",
        /// The request never reached the catalogue.
        Transport { message: String } => "book catalogue transport failed: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "book catalogue response could not be decoded: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalogue: Send + Sync {
    /// Run a search and map the volumes into summary cards.
    async fn search(&self, query: &BookSearchQuery) -> Result<BookSearchPage, BookCatalogueError>;

    /// Fetch one volume; `None` when the catalogue does not know the id.
    async fn details(&self, id: &BookId) -> Result<Option<BookDetails>, BookCatalogueError>;
}
