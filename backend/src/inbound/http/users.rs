//! User and session API handlers.
//!
//! ```text
//! POST   /api/v1/users                          register an account
//! POST   /api/v1/login                          establish a session
//! POST   /api/v1/logout                         drop the session
//! DELETE /api/v1/users/{id}/dangling-class-refs maintenance prune
//! ```

use actix_web::{delete, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::ports::UserRepositoryError;
use crate::domain::{
    Credentials, DenialReason, PasswordDigest, Principal, RegistrationError, Role,
    User, UserDraft, UserId, Username,
};
use crate::inbound::http::error::{ApiResult, ErrorBody};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body.
///
/// Accounts register as students unless `faculty` is set; admin accounts are
/// never created through this endpoint.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub faculty: bool,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account representation returned to clients. Never carries credentials.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    /// Ids of the classes this user teaches or is enrolled in.
    pub classes: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().to_string(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            email: user.email().to_owned(),
            username: user.username().to_string(),
            role: user.role(),
            classes: user.classes().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Result body of the maintenance prune.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrunedRefsResponse {
    /// Class ids dropped from the account.
    pub pruned: Vec<String>,
}

fn invalid(reason: impl Into<String>) -> RegistrationError {
    RegistrationError::invalid_request(reason)
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid payload or username taken", body = ErrorBody),
        (status = 500, description = "Write failed", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();

    let username =
        Username::new(&request.username).map_err(|err| invalid(err.to_string()))?;
    if request.password.is_empty() {
        return Err(invalid("password must not be empty"));
    }
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(invalid("first and last name must not be empty"));
    }
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(invalid("email must carry a domain"));
    }

    let role = if request.faculty {
        Role::Faculty
    } else {
        Role::Student
    };
    let user = User::new(
        UserDraft {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: email.to_owned(),
            username,
            password: PasswordDigest::new(&request.password),
            role,
        },
        Utc::now(),
    );

    match state.users.save(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id(), role = ?user.role(), "account registered");
            Ok(HttpResponse::Created().json(UserResponse::from(user)))
        }
        Err(UserRepositoryError::Conflict { message }) => Err(invalid(message)),
        Err(other) => Err(RegistrationError::unexpected(other.to_string())),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let credentials = Credentials::try_from_parts(&payload.username, &payload.password)
        .map_err(|err| invalid(err.to_string()))?;
    let username =
        Username::new(credentials.username()).map_err(|err| invalid(err.to_string()))?;

    let user = state
        .users
        .find_by_username(&username)
        .await
        .map_err(|err| RegistrationError::unexpected(err.to_string()))?
        .filter(|user| user.password().matches(credentials.password()))
        .ok_or(RegistrationError::Unauthorized(
            DenialReason::Unauthenticated,
        ))?;

    let principal = Principal::from(&user);
    session.persist_principal(&principal)?;
    tracing::info!(user_id = %user.id(), "session established");
    Ok(web::Json(UserResponse::from(user)))
}

/// Drop the caller's session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session dropped")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Drop a user's references to classes that no longer exist.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/dangling-class-refs",
    responses(
        (status = 200, description = "References pruned", body = PrunedRefsResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller is neither the owner nor an admin", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "pruneDanglingClassRefs"
)]
#[delete("/users/{id}/dangling-class-refs")]
pub async fn prune_class_refs(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PrunedRefsResponse>> {
    let owner = UserId::parse(&path)
        .map_err(|_| invalid("user id must be a UUID"))?;
    let principal = session.principal();
    let pruned = state
        .registration
        .prune_class_refs(principal.as_ref(), &owner)
        .await?;
    Ok(web::Json(PrunedRefsResponse {
        pruned: pruned.iter().map(ToString::to_string).collect(),
    }))
}
