//! # API エラー
//!
//! ハンドラ・ユースケース層のエラー型と、RFC 9457 Problem Details
//! レスポンスへの変換を定義する。
//!
//! ## 設計方針
//!
//! - **内部情報を漏らさない**: データベースエラーや予期しない失敗は
//!   `tracing::error!` で記録し、クライアントには固定文言の 500 を返す
//! - **配信失敗の開示は管理者のみ**: [`ApiError::DeliveryFailed`] は
//!   SMTP テスト送信の失敗理由をそのまま detail に含める。
//!   管理者専用エンドポイント以外では使用しない

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sari_domain::DomainError;
use sari_infra::InfraError;
use sari_shared::ErrorResponse;
use thiserror::Error;

/// API 層のエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 不正なリクエスト（形式エラー・検証失敗）
    #[error("{0}")]
    BadRequest(String),

    /// 認証情報の欠落・不正（上流 BFF からのヘッダ不備）
    #[error("{0}")]
    Unauthorized(String),

    /// 権限不足
    #[error("{0}")]
    Forbidden(String),

    /// リソースが存在しない
    #[error("{0}")]
    NotFound(String),

    /// メール配信失敗（管理者向けテスト送信専用）
    ///
    /// 失敗理由がそのまま detail に含まれる。
    #[error("{0}")]
    DeliveryFailed(String),

    /// インフラ層のエラー（クライアントには汎用 500）
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// その他の内部エラー（クライアントには汎用 500）
    #[error("{0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) => Self::BadRequest(err.to_string()),
            DomainError::NotFound { .. } => Self::NotFound(err.to_string()),
            DomainError::Forbidden(_) => Self::Forbidden(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::BadRequest(detail) => ErrorResponse::validation_error(detail),
            Self::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            Self::Forbidden(detail) => ErrorResponse::forbidden(detail),
            Self::NotFound(detail) => ErrorResponse::not_found(detail),
            Self::DeliveryFailed(detail) => ErrorResponse::delivery_failed(detail),
            Self::Infra(err) => {
                tracing::error!(error = %err, span_trace = %err.span_trace(), "インフラエラー");
                ErrorResponse::internal_error()
            }
            Self::Internal(detail) => {
                tracing::error!(detail, "内部エラー");
                ErrorResponse::internal_error()
            }
        };

        let status = StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ドメインエラーのステータスマッピング() {
        let validation: ApiError = DomainError::Validation("不正".to_string()).into();
        assert!(matches!(validation, ApiError::BadRequest(_)));

        let not_found: ApiError = DomainError::NotFound {
            entity_type: "Merchant",
            id:          "x".to_string(),
        }
        .into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let forbidden: ApiError = DomainError::Forbidden("権限なし".to_string()).into();
        assert!(matches!(forbidden, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_レスポンスのステータスコード() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Forbidden("x".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::DeliveryFailed("x".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("x".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
