//! Class API handlers.
//!
//! ```text
//! GET    /api/v1/classes                  open listing
//! GET    /api/v1/classes?owner={userId}   a user's own classes
//! POST   /api/v1/classes                  create
//! PUT    /api/v1/classes/{id}             update attributes
//! DELETE /api/v1/classes/{id}             delete
//! POST   /api/v1/classes/{id}/enrollment  enroll the caller
//! DELETE /api/v1/classes/{id}/enrollment  withdraw the caller
//! ```
//!
//! Handlers stay thin: extract the principal, call the registration
//! service, shape the response. Authorization lives behind the service's
//! gate, not here.

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{Class, ClassId, ClassSpec, RegistrationError, UserId};
use crate::inbound::http::error::{ApiResult, ErrorBody};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Class representation returned to clients.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub open: bool,
    /// Ids of the faculty members teaching the class.
    pub faculty: Vec<String>,
    /// Ids of the enrolled students.
    pub students: Vec<String>,
    #[schema(value_type = String)]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Class> for ClassResponse {
    fn from(class: Class) -> Self {
        Self {
            id: class.id().to_string(),
            name: class.name().to_owned(),
            capacity: class.capacity(),
            open: class.open(),
            faculty: class.faculty().iter().map(ToString::to_string).collect(),
            students: class.students().iter().map(ToString::to_string).collect(),
            created_at: class.created_at(),
        }
    }
}

/// Query string accepted by the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListClassesQuery {
    owner: Option<String>,
}

fn parse_class_id(raw: &str) -> Result<ClassId, RegistrationError> {
    ClassId::parse(raw)
        .map_err(|_| RegistrationError::invalid_request("class id must be a UUID"))
}

/// List open classes, or a user's own classes when `owner` is given.
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    responses(
        (status = 200, description = "Classes", body = [ClassResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Owner listing requested for another user", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "listClasses"
)]
#[get("/classes")]
pub async fn list_classes(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListClassesQuery>,
) -> ApiResult<web::Json<Vec<ClassResponse>>> {
    let principal = session.principal();
    let classes = match &query.owner {
        Some(raw) => {
            let owner = UserId::parse(raw).map_err(|_| {
                RegistrationError::invalid_request("owner must be a valid user id")
            })?;
            state
                .registration
                .classes_for_user(principal.as_ref(), &owner)
                .await?
        }
        None => state.registration.open_classes(principal.as_ref()).await?,
    };
    Ok(web::Json(
        classes.into_iter().map(ClassResponse::from).collect(),
    ))
}

/// Create a class owned by the calling faculty member.
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    request_body = ClassSpec,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller is not faculty", body = ErrorBody),
        (status = 500, description = "Write failed or partially applied", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "createClass"
)]
#[post("/classes")]
pub async fn create_class(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ClassSpec>,
) -> ApiResult<HttpResponse> {
    let principal = session.principal();
    let class = state
        .registration
        .create_class(principal.as_ref(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ClassResponse::from(class)))
}

/// Replace a class's attributes. Membership is preserved server-side.
#[utoipa::path(
    put,
    path = "/api/v1/classes/{id}",
    request_body = ClassSpec,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller does not teach the class", body = ErrorBody),
        (status = 404, description = "Unknown class", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "updateClass"
)]
#[put("/classes/{id}")]
pub async fn update_class(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ClassSpec>,
) -> ApiResult<web::Json<ClassResponse>> {
    let id = parse_class_id(&path)?;
    let principal = session.principal();
    let class = state
        .registration
        .update_class(principal.as_ref(), &id, payload.into_inner())
        .await?;
    Ok(web::Json(ClassResponse::from(class)))
}

/// Delete a class, returning its final state.
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}",
    responses(
        (status = 200, description = "Class deleted", body = ClassResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller does not teach the class", body = ErrorBody),
        (status = 404, description = "Unknown class", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "deleteClass"
)]
#[delete("/classes/{id}")]
pub async fn delete_class(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClassResponse>> {
    let id = parse_class_id(&path)?;
    let principal = session.principal();
    let class = state
        .registration
        .delete_class(principal.as_ref(), &id)
        .await?;
    Ok(web::Json(ClassResponse::from(class)))
}

/// Enroll the calling student in a class.
#[utoipa::path(
    post,
    path = "/api/v1/classes/{id}/enrollment",
    responses(
        (status = 200, description = "Enrolled", body = ClassResponse),
        (status = 400, description = "Class closed, full, or already joined", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller is not a student", body = ErrorBody),
        (status = 404, description = "Unknown class", body = ErrorBody),
        (status = 500, description = "Write failed or partially applied", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "enroll"
)]
#[post("/classes/{id}/enrollment")]
pub async fn enroll(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClassResponse>> {
    let id = parse_class_id(&path)?;
    let principal = session.principal();
    let class = state.registration.enroll(principal.as_ref(), &id).await?;
    Ok(web::Json(ClassResponse::from(class)))
}

/// Withdraw the calling student from a class it holds.
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}/enrollment",
    responses(
        (status = 200, description = "Withdrawn", body = ClassResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller does not hold the class", body = ErrorBody),
        (status = 404, description = "Unknown class", body = ErrorBody),
        (status = 500, description = "Write failed or partially applied", body = ErrorBody)
    ),
    tags = ["classes"],
    operation_id = "withdraw"
)]
#[delete("/classes/{id}/enrollment")]
pub async fn withdraw(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClassResponse>> {
    let id = parse_class_id(&path)?;
    let principal = session.principal();
    let class = state.registration.withdraw(principal.as_ref(), &id).await?;
    Ok(web::Json(ClassResponse::from(class)))
}
