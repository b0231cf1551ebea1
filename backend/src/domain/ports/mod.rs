//! Domain ports for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`, `AccountService`, `BookSearch`) are
//! called by inbound adapters. Driven ports (`*Repository`, `BookCatalogue`,
//! `ChatModel`, `PasswordHasher`) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod book_catalogue;
mod book_search;
mod chat_command;
mod chat_model;
mod conversation_repository;
mod conversations_command;
mod password_hasher;
mod reading_list_command;
mod reading_list_repository;
mod reading_stats_query;
mod recommendation_repository;
mod recommendations_command;
mod user_repository;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use book_catalogue::MockBookCatalogue;
pub use book_catalogue::{BookCatalogue, BookCatalogueError};
#[cfg(test)]
pub use book_search::MockBookSearch;
pub use book_search::BookSearch;
#[cfg(test)]
pub use chat_command::MockChatCommand;
pub use chat_command::ChatCommand;
#[cfg(test)]
pub use chat_model::MockChatModel;
pub use chat_model::{
    ChatMessage, ChatModel, ChatModelError, ChatRole, Completion, CompletionRequest, ToolCall,
    ToolDefinition,
};
#[cfg(test)]
pub use conversation_repository::MockConversationRepository;
pub use conversation_repository::{ConversationRepository, ConversationRepositoryError};
#[cfg(test)]
pub use conversations_command::MockConversationsCommand;
pub use conversations_command::ConversationsCommand;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use reading_list_command::MockReadingListCommand;
pub use reading_list_command::ReadingListCommand;
#[cfg(test)]
pub use reading_list_repository::MockReadingListRepository;
pub use reading_list_repository::{
    FinishedReading, ReadingListRepository, ReadingListRepositoryError,
};
#[cfg(test)]
pub use reading_stats_query::MockReadingStatsQuery;
pub use reading_stats_query::ReadingStatsQuery;
#[cfg(test)]
pub use recommendation_repository::MockRecommendationRepository;
pub use recommendation_repository::{RecommendationRepository, RecommendationRepositoryError};
#[cfg(test)]
pub use recommendations_command::MockRecommendationsCommand;
pub use recommendations_command::{RecommendationsCommand, TrackedRecommendation};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
