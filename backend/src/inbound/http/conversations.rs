//! Conversation and message HTTP handlers.
//!
//! ```text
//! GET    /api/v1/conversations
//! POST   /api/v1/conversations {"title":"Sci-fi","firstMessage":"space opera?"}
//! PUT    /api/v1/conversations/{id} {"title":"Renamed"}
//! DELETE /api/v1/conversations/{id}
//! GET    /api/v1/conversations/{id}/messages
//! POST   /api/v1/conversations/{id}/messages {"role":"user","content":"hi","books":[]}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Book, Conversation, ConversationChanges, Error, Message, MessageRole, MessageValidationError,
    NewMessage,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{field_error, parse_conversation_id};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(value: Conversation) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title,
            preview: value.preview,
            message_count: value.message_count,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub books: Vec<Book>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(value: Message) -> Self {
        Self {
            id: value.id,
            conversation_id: value.conversation_id.to_string(),
            role: value.role,
            content: value.content,
            books: value.books,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationEnvelope {
    pub conversation: ConversationResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedMessageResponse {
    pub message: MessageResponse,
    /// True when an identical message saved moments earlier was returned.
    pub duplicate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    pub first_message: Option<String>,
}

/// Partial header update; absent fields stay untouched.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub message_count: Option<i32>,
    pub preview: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SaveMessageRequest {
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub books: Vec<Book>,
}

fn map_message_error(err: MessageValidationError) -> Error {
    match &err {
        MessageValidationError::MissingRole => field_error("role", "missing_field", &err),
        MessageValidationError::InvalidRole { .. } => field_error("role", "invalid_role", &err),
        MessageValidationError::EmptyMessage => field_error("content", "empty_message", &err),
    }
}

/// Recent conversations of the signed-in reader.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    responses(
        (status = 200, description = "Newest first, at most 20", body = ConversationListResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "listConversations"
)]
#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ConversationListResponse>> {
    let user_id = session.require_user_id()?;
    let conversations = state.conversations.list(&user_id).await?;
    Ok(web::Json(ConversationListResponse {
        conversations: conversations.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationEnvelope),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "createConversation"
)]
#[post("/conversations")]
pub async fn create_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateConversationRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let CreateConversationRequest {
        title,
        first_message,
    } = payload.into_inner();
    let conversation = state
        .conversations
        .create(&user_id, title, first_message)
        .await?;
    Ok(HttpResponse::Created().json(ConversationEnvelope {
        conversation: conversation.into(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/conversations/{id}",
    params(("id" = String, Path, description = "Conversation id")),
    request_body = UpdateConversationRequest,
    responses(
        (status = 200, description = "Conversation updated", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "updateConversation"
)]
#[put("/conversations/{id}")]
pub async fn update_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateConversationRequest>,
) -> ApiResult<web::Json<SuccessResponse>> {
    let user_id = session.require_user_id()?;
    let id = parse_conversation_id(&path.into_inner())?;
    let UpdateConversationRequest {
        title,
        message_count,
        preview,
    } = payload.into_inner();
    state
        .conversations
        .update(
            &user_id,
            &id,
            ConversationChanges {
                title,
                message_count,
                preview,
            },
        )
        .await?;
    Ok(web::Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{id}",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation and its messages deleted", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "deleteConversation"
)]
#[delete("/conversations/{id}")]
pub async fn delete_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SuccessResponse>> {
    let user_id = session.require_user_id()?;
    let id = parse_conversation_id(&path.into_inner())?;
    state.conversations.delete(&user_id, &id).await?;
    Ok(web::Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Messages, oldest first", body = MessageListResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "listMessages"
)]
#[get("/conversations/{id}/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageListResponse>> {
    let user_id = session.require_user_id()?;
    let id = parse_conversation_id(&path.into_inner())?;
    let messages = state.conversations.messages(&user_id, &id).await?;
    Ok(web::Json(MessageListResponse {
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

/// Save a message. A repeat of a message saved in the last two seconds
/// returns the stored one with status 200.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    params(("id" = String, Path, description = "Conversation id")),
    request_body = SaveMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = SavedMessageResponse),
        (status = 200, description = "Duplicate of a recent message", body = SavedMessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "saveMessage"
)]
#[post("/conversations/{id}/messages")]
pub async fn save_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SaveMessageRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_conversation_id(&path.into_inner())?;
    let SaveMessageRequest {
        role,
        content,
        books,
    } = payload.into_inner();
    let message =
        NewMessage::try_new(role.as_deref(), &content, books).map_err(map_message_error)?;

    let saved = state
        .conversations
        .save_message(&user_id, &id, message)
        .await?;
    let duplicate = saved.is_duplicate();
    let body = SavedMessageResponse {
        message: saved.into_message().into(),
        duplicate,
    };
    Ok(if duplicate {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::Created().json(body)
    })
}
