//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (auth, chat,
//!   books, conversations, reading list, recommendations, stats, health)
//! - **Schemas**: the error envelope plus whatever the paths reference
//! - **Security**: session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Bookchat API",
        description = "Book discovery chat with catalogue search, conversations, reading lists, and reading statistics."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::chat::chat,
        crate::inbound::http::chat::chat_stream,
        crate::inbound::http::books::search_books,
        crate::inbound::http::books::book_details,
        crate::inbound::http::conversations::list_conversations,
        crate::inbound::http::conversations::create_conversation,
        crate::inbound::http::conversations::update_conversation,
        crate::inbound::http::conversations::delete_conversation,
        crate::inbound::http::conversations::list_messages,
        crate::inbound::http::conversations::save_message,
        crate::inbound::http::reading_list::list_reading_list,
        crate::inbound::http::reading_list::add_to_reading_list,
        crate::inbound::http::reading_list::remove_from_reading_list,
        crate::inbound::http::reading_list::mark_as_read,
        crate::inbound::http::recommendations::list_recommendations,
        crate::inbound::http::recommendations::track_recommendation,
        crate::inbound::http::reading_stats::reading_stats,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Registration and session management"),
        (name = "chat", description = "Assistant turns, plain and streamed"),
        (name = "books", description = "Catalogue search and volume details"),
        (name = "conversations", description = "Stored conversations and messages"),
        (name = "reading-list", description = "Books the reader wants to read or has read"),
        (name = "recommendations", description = "Recommendations the reader opened"),
        (name = "reading-stats", description = "Aggregates over finished books"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document's paths and schemas.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_wire_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    #[case("/api/v1/auth/register")]
    #[case("/api/v1/auth/me")]
    #[case("/api/v1/chat")]
    #[case("/api/v1/chat/stream")]
    #[case("/api/v1/books/search")]
    #[case("/api/v1/books/{id}")]
    #[case("/api/v1/conversations/{id}/messages")]
    #[case("/api/v1/reading-list")]
    #[case("/api/v1/recommendations")]
    #[case("/api/v1/reading-stats")]
    #[case("/health/ready")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
