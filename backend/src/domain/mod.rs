//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, and the services that implement the driving ports.
//! Types validate on construction so adapters never hold half-checked data.
//!
//! Public surface:
//! - Error, ErrorCode: API error payload and its stable identifier.
//! - User, UserId, Email, DisplayName: account identity.
//! - Book, BookDetails, BookSearchQuery: catalogue views and lookups.
//! - Conversation, Message, NewMessage: stored chat history.
//! - ReadingListEntry, Recommendation, ReadingStats: reader state.
//! - DuplicateMessageCleaner: maintenance pass over stored history.
//! - `chat`: orchestration between the reader, the model, and the catalogue.
//! - `ports`: the hexagonal boundary.

pub mod auth;
pub mod book;
pub mod book_search_service;
pub mod chat;
pub mod conversation;
pub mod conversation_service;
pub mod error;
pub mod message_cleanup;
pub mod ports;
pub mod reading_list;
pub mod reading_list_service;
pub mod reading_stats;
pub mod recommendation;
pub mod recommendation_service;
pub mod trace_id;
pub mod user;
pub mod user_account_service;

pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN_LENGTH, Registration,
    RegistrationValidationError,
};
pub use self::book::{
    Book, BookDetails, BookId, BookQueryValidationError, BookSearchPage, BookSearchQuery,
    DEFAULT_MAX_RESULTS, ImageLinks, IndustryIdentifier, MAX_RESULTS_LIMIT, OrderBy, Price,
    SaleInfo,
};
pub use self::book_search_service::BookSearchService;
pub use self::conversation::{
    CONVERSATION_LIST_LIMIT, Conversation, ConversationChanges, ConversationId,
    DEFAULT_CONVERSATION_TITLE, Message, MessageRole, MessageValidationError, NewMessage,
    SavedMessage, duplicate_message_ids, message_dedup_window,
};
pub use self::conversation_service::ConversationService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::message_cleanup::{CleanupReport, ConversationCleanup, DuplicateMessageCleaner};
pub use self::reading_list::{
    BookMetadata, MarkAsRead, NewReadingListEntry, Priority, ReadingListEntry,
    ReadingListValidationError,
};
pub use self::reading_list_service::ReadingListService;
pub use self::reading_stats::{
    AuthorCount, GenreCount, GroupBy, MonthCount, ReadingStats, StatsPeriod,
    StatsValidationError, compute_reading_stats,
};
pub use self::recommendation::{
    RECOMMENDATION_LIST_LIMIT, Recommendation, RecommendationClick, RecommendationDetails,
    RecommendationValidationError,
};
pub use self::recommendation_service::RecommendationService;
pub use self::trace_id::TraceId;
pub use self::user::{DisplayName, Email, StoredUser, User, UserId, UserValidationError};
pub use self::user_account_service::{INVALID_CREDENTIALS, UserAccountService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use bookchat::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<u32> {
///     Err(Error::not_found("no such book"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
