//! Driving port for catalogue lookups exposed over HTTP and to chat tools.

use async_trait::async_trait;

use crate::domain::{BookDetails, BookId, BookSearchPage, BookSearchQuery, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookSearch: Send + Sync {
    async fn search(&self, query: &BookSearchQuery) -> Result<BookSearchPage, Error>;

    /// Fetch one volume; unknown ids are "not found".
    async fn details(&self, id: &BookId) -> Result<BookDetails, Error>;
}
