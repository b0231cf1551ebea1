//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"reader@example.com","password":"Secret123","name":"Ada"}
//! POST /api/v1/auth/login {"email":"reader@example.com","password":"Secret123"}
//! POST /api/v1/auth/logout
//! GET /api/v1/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, Registration, RegistrationValidationError,
    User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, missing_field_error};

/// Sign-up payload. Fields are optional so absence maps to a 400 with details.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserResponse {
    fn summary(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.to_string(),
            name: user.name.as_ref().to_owned(),
            created_at: None,
        }
    }

    fn full(user: &User) -> Self {
        Self {
            created_at: Some(user.created_at.to_rfc3339()),
            ..Self::summary(user)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(FieldName::new(field)))
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    field_error(err.field(), err.code(), &err)
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyEmail => ("email", "missing_email"),
        LoginValidationError::InvalidEmail => ("email", "invalid_email"),
        LoginValidationError::EmptyPassword => ("password", "missing_password"),
    };
    field_error(field, code, &err)
}

fn parse_registration(payload: RegisterRequest) -> Result<Registration, Error> {
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;
    let name = required(payload.name, "name")?;
    Registration::try_from_parts(&email, &password, &name).map_err(map_registration_error)
}

fn parse_login(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;
    LoginCredentials::try_from_parts(&email, &password).map_err(map_login_validation_error)
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = parse_registration(payload.into_inner())?;
    let user = state.accounts.register(&registration).await?;
    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".to_owned(),
        user: UserResponse::summary(&user),
    }))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthResponse, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let credentials = parse_login(payload.into_inner())?;
    let user = state.accounts.login(&credentials).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(AuthResponse {
        message: "Login successful".to_owned(),
        user: UserResponse::full(&user),
    }))
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> web::Json<MessageResponse> {
    session.clear();
    web::Json(MessageResponse {
        message: "Logout successful".to_owned(),
    })
}

/// Resolve the session user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AuthResponse>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.current_user(&user_id).await?;
    Ok(web::Json(AuthResponse {
        message: "Authenticated".to_owned(),
        user: UserResponse::full(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Email, UserId};
    use crate::inbound::http::test_utils::{
        MockPorts, login_route, session_cookie, test_session_middleware, test_user_id,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn user(id: UserId) -> User {
        User {
            id,
            email: Email::new("reader@example.com").expect("email"),
            name: DisplayName::new("Ada Reader").expect("name"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            last_login: None,
        }
    }

    fn auth_app(
        ports: MockPorts,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(ports.into_state())
            .wrap(test_session_middleware())
            .configure(login_route)
            .service(
                web::scope("/api/v1")
                    .service(register)
                    .service(login)
                    .service(logout)
                    .service(me),
            )
    }

    async fn body_json(response: actix_web::dev::ServiceResponse) -> Value {
        serde_json::from_slice(&actix_test::read_body(response).await).expect("json body")
    }

    #[rstest]
    #[actix_web::test]
    async fn register_returns_created_user() {
        let mut ports = MockPorts::default();
        ports
            .accounts
            .expect_register()
            .withf(|registration| registration.email().as_ref() == "reader@example.com")
            .times(1)
            .return_once(|_| Ok(user(test_user_id())));
        let app = actix_test::init_service(auth_app(ports)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": " Reader@Example.com ",
                    "password": "Secret123",
                    "name": "Ada Reader"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["userId"], test_user_id().to_string());
        assert!(body["user"].get("createdAt").is_none());
    }

    #[rstest]
    #[case::missing_name(json!({"email": "a@b.co", "password": "Secret123"}), "name", "missing_field")]
    #[case::bad_email(json!({"email": "nope", "password": "Secret123", "name": "Ada"}), "email", "invalid_email")]
    #[case::weak_password(json!({"email": "a@b.co", "password": "secret123", "name": "Ada"}), "password", "weak_password")]
    #[case::short_password(json!({"email": "a@b.co", "password": "Se1", "name": "Ada"}), "password", "password_too_short")]
    #[case::short_name(json!({"email": "a@b.co", "password": "Secret123", "name": " A "}), "name", "name_too_short")]
    #[actix_web::test]
    async fn register_rejects_invalid_payloads(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(auth_app(MockPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[actix_web::test]
    async fn login_sets_a_session_that_me_accepts() {
        let mut ports = MockPorts::default();
        ports
            .accounts
            .expect_login()
            .times(1)
            .return_once(|_| Ok(user(test_user_id())));
        ports
            .accounts
            .expect_current_user()
            .withf(|id| *id == test_user_id())
            .times(1)
            .return_once(|id| Ok(user(*id)));
        let app = actix_test::init_service(auth_app(ports)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": "reader@example.com", "password": "Secret123" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|cookie| cookie.into_owned())
            .expect("session cookie");
        let body = body_json(response).await;
        assert_eq!(body["user"]["createdAt"], "2024-01-02T03:04:05+00:00");

        let me_response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me_response.status(), StatusCode::OK);
        let body = body_json(me_response).await;
        assert_eq!(body["user"]["email"], "reader@example.com");
    }

    #[rstest]
    #[actix_web::test]
    async fn login_failures_do_not_set_a_session() {
        let mut ports = MockPorts::default();
        ports
            .accounts
            .expect_login()
            .return_once(|_| Err(Error::unauthorized("invalid credentials")));
        let app = actix_test::init_service(auth_app(ports)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": "reader@example.com", "password": "wrong" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response
                .response()
                .cookies()
                .all(|cookie| cookie.name() != "session")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn me_requires_a_session() {
        let app = actix_test::init_service(auth_app(MockPorts::default())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/auth/me").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_purges_the_session() {
        let app = actix_test::init_service(auth_app(MockPorts::default())).await;
        let cookie = session_cookie(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let removal = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
