//! グローバル通知設定ハンドラ（管理者専用）

use std::sync::Arc;

use axum::{Json, extract::State};
use sari_domain::notification::{GlobalNotificationSettings, GlobalNotificationSettingsUpdate};
use sari_shared::ApiResponse;

use crate::{app::AppState, error::ApiError};

/// `GET /api/v1/admin/notification-settings`
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<GlobalNotificationSettings>>, ApiError> {
    let settings = state.settings.get().await?;
    Ok(Json(ApiResponse::new(settings)))
}

/// `PUT /api/v1/admin/notification-settings`
///
/// 部分更新。ボディに含まれないフィールドは現在値を維持する。
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<GlobalNotificationSettingsUpdate>,
) -> Result<Json<ApiResponse<GlobalNotificationSettings>>, ApiError> {
    let settings = state.settings.update(update).await?;
    Ok(Json(ApiResponse::new(settings)))
}
