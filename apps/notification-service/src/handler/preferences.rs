//! マーチャント通知設定ハンドラ
//!
//! マーチャントロールは自身の設定のみ、管理者は全マーチャントの
//! 設定を操作できる。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use sari_domain::{
    merchant::MerchantId,
    notification::{NotificationPreference, NotificationPreferenceUpdate},
};
use sari_shared::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, auth::AuthContext, error::ApiError};

/// `GET /api/v1/merchants/{merchant_id}/notification-preferences`
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<NotificationPreference>>, ApiError> {
    let merchant_id = MerchantId::from_uuid(merchant_id);
    auth.authorize_merchant(&merchant_id)?;

    let preference = state.preferences.get(&merchant_id).await?;
    Ok(Json(ApiResponse::new(preference)))
}

/// `PUT /api/v1/merchants/{merchant_id}/notification-preferences`
///
/// 部分更新。ボディに含まれないフィールドは現在値を維持する。
pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<Uuid>,
    auth: AuthContext,
    Json(update): Json<NotificationPreferenceUpdate>,
) -> Result<Json<ApiResponse<NotificationPreference>>, ApiError> {
    let merchant_id = MerchantId::from_uuid(merchant_id);
    auth.authorize_merchant(&merchant_id)?;

    let preference = state.preferences.update(&merchant_id, update).await?;
    Ok(Json(ApiResponse::new(preference)))
}
