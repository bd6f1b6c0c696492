//! 通知ディスパッチハンドラ（内部 API）
//!
//! サービス間通信専用。外部公開はゲートウェイで遮断される前提。

use std::sync::Arc;

use axum::{Json, extract::State};
use sari_domain::{merchant::MerchantId, notification::NotificationKind};
use sari_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::ApiError,
    usecase::{DispatchInput, DispatchOutcome},
};

/// ディスパッチリクエスト
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub merchant_id: Uuid,
    pub kind:        NotificationKind,
    pub title:       String,
    pub body:        String,
    pub link:        Option<String>,
    pub metadata:    Option<serde_json::Value>,
}

/// ディスパッチレスポンス
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    /// `dispatched` または `suppressed`
    pub status:          &'static str,
    /// 作成された通知ログ ID。抑止時は `null`
    pub notification_id: Option<String>,
}

/// `POST /internal/notifications/dispatch`
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<ApiResponse<DispatchResponse>>, ApiError> {
    let outcome = state
        .dispatch
        .dispatch(DispatchInput {
            merchant_id: MerchantId::from_uuid(request.merchant_id),
            kind:        request.kind,
            title:       request.title,
            body:        request.body,
            link:        request.link,
            metadata:    request.metadata,
        })
        .await?;

    let response = match outcome {
        DispatchOutcome::Dispatched { notification_id } => DispatchResponse {
            status:          "dispatched",
            notification_id: Some(notification_id.to_string()),
        },
        DispatchOutcome::Suppressed => DispatchResponse {
            status:          "suppressed",
            notification_id: None,
        },
    };
    Ok(Json(ApiResponse::new(response)))
}
