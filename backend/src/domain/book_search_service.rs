//! Catalogue lookups with upstream failures mapped to domain errors.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{BookCatalogue, BookCatalogueError, BookSearch};
use crate::domain::{BookDetails, BookId, BookSearchPage, BookSearchQuery, Error};

/// Translate catalogue failures into client-facing errors.
pub fn map_catalogue_error(error: BookCatalogueError) -> Error {
    match error {
        BookCatalogueError::Timeout { .. } => {
            Error::gateway_timeout("the book catalogue did not respond in time")
        }
        BookCatalogueError::RateLimited { .. } => {
            Error::rate_limited("the book catalogue is throttling requests; try again shortly")
        }
        BookCatalogueError::Upstream { status, .. } => {
            Error::upstream(format!("the book catalogue returned status {status}"))
        }
        BookCatalogueError::Transport { .. } => {
            Error::service_unavailable("the book catalogue is unreachable")
        }
        BookCatalogueError::Decode { .. } => {
            Error::upstream("the book catalogue returned an unreadable response")
        }
    }
}

#[derive(Clone)]
pub struct BookSearchService<C> {
    catalogue: Arc<C>,
}

impl<C> BookSearchService<C> {
    pub fn new(catalogue: Arc<C>) -> Self {
        Self { catalogue }
    }
}

#[async_trait]
impl<C> BookSearch for BookSearchService<C>
where
    C: BookCatalogue,
{
    async fn search(&self, query: &BookSearchQuery) -> Result<BookSearchPage, Error> {
        self.catalogue.search(query).await.map_err(|error| {
            tracing::error!(%error, query = query.query(), "book search failed");
            map_catalogue_error(error)
        })
    }

    async fn details(&self, id: &BookId) -> Result<BookDetails, Error> {
        self.catalogue
            .details(id)
            .await
            .map_err(|error| {
                tracing::error!(%error, book_id = %id, "book details lookup failed");
                map_catalogue_error(error)
            })?
            .ok_or_else(|| Error::not_found(format!("book {id} not found")))
    }
}
