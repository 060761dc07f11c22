//! Error handling for the API server
//!
//! JSON routes return `Result<T, ApiError>`; the error becomes a status code
//! and a `{error, message, details?}` body. Form routes (`/contactar`,
//! `POST /mensajes/:id`) turn the same errors into a redirect carrying the
//! message in an `error` query parameter, see [`redirect_with_error`].
//!
//! Messages are shown to end users and are in Spanish. Internal details are
//! logged and replaced by a generic message.
//!
//! # Example
//!
//! ```
//! use reciclaje_api::error::{ApiError, ApiResult};
//! use axum::Json;
//! use serde_json::{json, Value};
//!
//! async fn handler(found: bool) -> ApiResult<Json<Value>> {
//!     if !found {
//!         return Err(ApiError::NotFound("Publicación no encontrada".to_string()));
//!     }
//!     Ok(Json(json!({ "ok": true })))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use reciclaje_shared::{
    auth::{jwt::JwtError, password::PasswordError, session::SessionError},
    messaging::MessagingError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_MESSAGE: &str = "Ocurrió un error interno";

// SQLSTATE codes
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),

    /// 401
    Unauthorized(String),

    /// 403
    Forbidden(String),

    /// 404
    NotFound(String),

    /// 409, e.g. duplicate email or second rating
    Conflict(String),

    /// 422
    ValidationError(Vec<ValidationErrorDetail>),

    /// 500; the message is logged, never returned
    InternalError(String),

    /// 503
    ServiceUnavailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine readable code, e.g. `bad_request`
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Message safe to show to the user
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::ValidationError(details) => details
                .first()
                .map(|d| d.message.clone())
                .unwrap_or_else(|| "Datos inválidos".to_string()),
            ApiError::InternalError(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    fn log_if_internal(&self) {
        if let ApiError::InternalError(msg) = self {
            tracing::error!("Internal error: {}", msg);
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => write!(f, "Validation failed: {} errors", errors.len()),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_if_internal();

        let status = self.status();
        let error = self.code().to_string();
        let message = match &self {
            ApiError::ValidationError(_) => "La solicitud no es válida".to_string(),
            other => other.public_message(),
        };
        let details = match self {
            ApiError::ValidationError(details) => Some(details),
            _ => None,
        };

        (status, Json(ErrorResponse { error, message, details })).into_response()
    }
}

/// Redirect to `path` with the message in the `error` query parameter
pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message)))
}

impl ApiError {
    /// Form-route rendition of the error
    pub fn into_redirect(self, path: &str) -> Redirect {
        self.log_if_internal();
        redirect_with_error(path, &self.public_message())
    }
}

/// Maps constraint names to user messages
fn constraint_message(constraint: &str) -> String {
    match constraint {
        "usuarios_email_key" => "El correo ya está registrado".to_string(),
        "valoraciones_listing_rater_key" => "Ya valoraste esta publicación".to_string(),
        "conversaciones_pair_key" => "La conversación ya existe".to_string(),
        other => format!("Restricción violada: {}", other),
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Recurso no encontrado".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    return ApiError::Conflict(constraint_message(constraint));
                }

                match db_err.code().as_deref() {
                    Some(FOREIGN_KEY_VIOLATION) => ApiError::BadRequest("Referencia inválida".to_string()),
                    Some(CHECK_VIOLATION) => ApiError::BadRequest("Valor fuera de rango".to_string()),
                    _ => ApiError::InternalError(format!("Database error: {}", db_err)),
                }
            }
            sqlx::Error::PoolTimedOut => ApiError::ServiceUnavailable("Base de datos no disponible".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingCredentials => ApiError::Unauthorized("Debes iniciar sesión".to_string()),
            SessionError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            SessionError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            JwtError::Expired => ApiError::Unauthorized("La sesión expiró".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Emisor de token inválido".to_string()),
            _ => ApiError::Unauthorized(format!("Token inválido: {}", err)),
        }
    }
}

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::SelfContact
            | MessagingError::EmptyMessage
            | MessagingError::MessageTooLong { .. } => ApiError::BadRequest(err.to_string()),
            MessagingError::RecipientNotFound
            | MessagingError::ListingNotFound
            | MessagingError::ConversationNotFound
            | MessagingError::MessageNotFound => ApiError::NotFound(err.to_string()),
            MessagingError::NotParticipant => ApiError::Forbidden(err.to_string()),
            MessagingError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Valor inválido".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}
