//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, BookSearch, ChatCommand, ConversationsCommand, ReadingListCommand,
    ReadingStatsQuery, RecommendationsCommand,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub books: Arc<dyn BookSearch>,
    pub chat: Arc<dyn ChatCommand>,
    pub conversations: Arc<dyn ConversationsCommand>,
    pub reading_list: Arc<dyn ReadingListCommand>,
    pub reading_stats: Arc<dyn ReadingStatsQuery>,
    pub recommendations: Arc<dyn RecommendationsCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub books: Arc<dyn BookSearch>,
    pub chat: Arc<dyn ChatCommand>,
    pub conversations: Arc<dyn ConversationsCommand>,
    pub reading_list: Arc<dyn ReadingListCommand>,
    pub reading_stats: Arc<dyn ReadingStatsQuery>,
    pub recommendations: Arc<dyn RecommendationsCommand>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use bookchat::domain::ports::{
    ///     AccountService, BookSearch, ChatCommand, ConversationsCommand, ReadingListCommand,
    ///     ReadingStatsQuery, RecommendationsCommand,
    /// };
    /// use bookchat::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// fn build(
    ///     accounts: Arc<dyn AccountService>,
    ///     books: Arc<dyn BookSearch>,
    ///     chat: Arc<dyn ChatCommand>,
    ///     conversations: Arc<dyn ConversationsCommand>,
    ///     reading_list: Arc<dyn ReadingListCommand>,
    ///     reading_stats: Arc<dyn ReadingStatsQuery>,
    ///     recommendations: Arc<dyn RecommendationsCommand>,
    /// ) -> HttpState {
    ///     HttpState::new(HttpStatePorts {
    ///         accounts,
    ///         books,
    ///         chat,
    ///         conversations,
    ///         reading_list,
    ///         reading_stats,
    ///         recommendations,
    ///     })
    /// }
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            books,
            chat,
            conversations,
            reading_list,
            reading_stats,
            recommendations,
        } = ports;
        Self {
            accounts,
            books,
            chat,
            conversations,
            reading_list,
            reading_stats,
            recommendations,
        }
    }
}
