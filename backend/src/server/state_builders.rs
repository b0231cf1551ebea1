//! Builders wiring outbound adapters into the domain services behind
//! [`HttpState`].

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use bookchat::domain::chat::ChatService;
use bookchat::domain::{
    BookSearchService, ConversationService, ReadingListService, RecommendationService,
    UserAccountService,
};
use bookchat::inbound::http::state::{HttpState, HttpStatePorts};
use bookchat::outbound::google_books::{GoogleBooksHttpSource, GoogleBooksSettings};
use bookchat::outbound::llm::OpenAiCompatibleChatModel;
use bookchat::outbound::password::Argon2PasswordHasher;
use bookchat::outbound::persistence::{
    DbPool, DieselConversationRepository, DieselReadingListRepository,
    DieselRecommendationRepository, DieselUserRepository,
};

use super::config::{AppSettings, SettingsError};

fn settings_error(err: SettingsError) -> io::Error {
    io::Error::other(err.to_string())
}

fn build_catalogue(settings: &AppSettings) -> io::Result<GoogleBooksHttpSource> {
    GoogleBooksHttpSource::new(
        settings.google_books_base_url().map_err(settings_error)?,
        settings.google_books_timeout(),
        GoogleBooksSettings {
            api_key: settings.google_books_api_key.clone(),
            lang_restrict: settings.google_books_lang.clone(),
        },
    )
    .map_err(|err| io::Error::other(format!("build catalogue client: {err}")))
}

fn build_chat_model(settings: &AppSettings) -> io::Result<OpenAiCompatibleChatModel> {
    OpenAiCompatibleChatModel::new(
        settings.llm_base_url().map_err(settings_error)?,
        settings.llm_timeout(),
        settings.llm_settings().map_err(settings_error)?,
    )
    .map_err(|err| io::Error::other(format!("build chat model client: {err}")))
}

/// Assemble every driving port over the shared pool and HTTP clients.
///
/// # Errors
///
/// Returns [`io::Error`] when a setting is missing or an HTTP client cannot
/// be built.
pub fn build_http_state(pool: &DbPool, settings: &AppSettings) -> io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let books = Arc::new(BookSearchService::new(Arc::new(build_catalogue(settings)?)));
    let conversations = Arc::new(ConversationService::new(
        Arc::new(DieselConversationRepository::new(pool.clone())),
        clock.clone(),
    ));
    let chat = Arc::new(ChatService::new(
        Arc::new(build_chat_model(settings)?),
        books.clone(),
        conversations.clone(),
    ));
    let reading_list = Arc::new(ReadingListService::new(
        Arc::new(DieselReadingListRepository::new(pool.clone())),
        clock.clone(),
    ));
    let recommendations = Arc::new(RecommendationService::new(
        Arc::new(DieselRecommendationRepository::new(pool.clone())),
        clock.clone(),
    ));
    let accounts = Arc::new(UserAccountService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()),
        clock,
    ));

    Ok(web::Data::new(HttpState::new(HttpStatePorts {
        accounts,
        books,
        chat,
        conversations,
        reading_list: reading_list.clone(),
        reading_stats: reading_list,
        recommendations,
    })))
}
