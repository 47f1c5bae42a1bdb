/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - AuthError / RepoError を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthorized { code, message } => (code, message),
            AppError::Forbidden => ("FORBIDDEN", "forbidden".into()),
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found.")),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Db(_) => AppError::Internal,
        }
    }
}

// 認証失敗はここで HTTP status へ写像する:
// - ヘッダ欠落・未対応形式・claims 不正 → 400
// - 署名不正・期限切れ → 401
// - それ以外の decode 失敗 → 500
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => {
                AppError::bad_request("TOKEN_MISSING", "authorization header is required")
            }
            AuthError::BadSignature => AppError::Unauthorized {
                code: "INVALID_SIGNATURE",
                message: "invalid token signature".into(),
            },
            AuthError::Expired => AppError::Unauthorized {
                code: "TOKEN_EXPIRED",
                message: "token has expired".into(),
            },
            AuthError::Unsupported => {
                AppError::bad_request("TOKEN_UNSUPPORTED", "unsupported token format")
            }
            AuthError::InvalidClaims(claim) => {
                AppError::bad_request("INVALID_CLAIMS", format!("invalid token claim: {claim}"))
            }
            AuthError::Internal => AppError::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_distinct_statuses() {
        let cases = [
            (AuthError::MissingToken, StatusCode::BAD_REQUEST),
            (AuthError::BadSignature, StatusCode::UNAUTHORIZED),
            (AuthError::Expired, StatusCode::UNAUTHORIZED),
            (AuthError::Unsupported, StatusCode::BAD_REQUEST),
            (
                AuthError::InvalidClaims("userRole"),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn repo_errors_surface_as_internal() {
        let err = AppError::from(RepoError::Db(sqlx::Error::PoolClosed));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
