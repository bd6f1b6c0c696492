//! SMTP 設定・テスト送信・メールログハンドラ（管理者専用）
//!
//! パスワードはレスポンスに一切含めない。暗号化済みの値も
//! [`SmtpSettingsView`] への変換で落とされる。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use sari_domain::{
    email::{EmailLog, EmailStats},
    smtp::{SmtpSettings, SmtpSettingsInput},
    value_objects::EmailAddress,
};
use sari_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::SuccessResponse;
use crate::{app::AppState, error::ApiError};

/// SMTP 設定の読み取り用ビュー
///
/// パスワードフィールドを持たない（書き込み専用のため）。
#[derive(Debug, Serialize)]
pub struct SmtpSettingsView {
    pub host:       String,
    pub port:       u16,
    pub username:   String,
    pub from_email: EmailAddress,
    pub from_name:  String,
    pub is_active:  bool,
    pub updated_at: DateTime<Utc>,
}

impl From<SmtpSettings> for SmtpSettingsView {
    fn from(settings: SmtpSettings) -> Self {
        Self {
            host:       settings.host,
            port:       settings.port,
            username:   settings.username,
            from_email: settings.from_email,
            from_name:  settings.from_name,
            is_active:  settings.is_active,
            updated_at: settings.updated_at,
        }
    }
}

/// `GET /api/v1/admin/smtp/settings`
///
/// 未設定の場合は `data: null` を返す。
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<SmtpSettingsView>>>, ApiError> {
    let settings = state.smtp.get_settings().await?;
    Ok(Json(ApiResponse::new(settings.map(SmtpSettingsView::from))))
}

/// `PUT /api/v1/admin/smtp/settings`
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SmtpSettingsInput>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    state.smtp.update_settings(input).await?;
    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// テスト送信リクエスト
#[derive(Debug, Deserialize)]
pub struct SmtpTestRequest {
    pub email: EmailAddress,
}

/// `POST /api/v1/admin/smtp/test`
///
/// 失敗時は失敗理由を detail に含む 500 を返す（管理者専用のため）。
pub async fn post_test(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SmtpTestRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    state.smtp.send_test(request.email).await?;
    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// メールログ一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct EmailLogsQuery {
    pub limit: Option<i64>,
}

/// `GET /api/v1/admin/smtp/logs?limit=50`
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailLogsQuery>,
) -> Result<Json<ApiResponse<Vec<EmailLog>>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let logs = state.smtp.recent_logs(limit).await?;
    Ok(Json(ApiResponse::new(logs)))
}

/// `GET /api/v1/admin/smtp/stats`
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EmailStats>>, ApiError> {
    let stats = state.smtp.stats().await?;
    Ok(Json(ApiResponse::new(stats)))
}
