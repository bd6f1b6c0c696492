//! 通知ログ一覧ハンドラ（管理者専用）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use sari_domain::{
    merchant::MerchantId,
    notification::{NotificationKind, NotificationLog, NotificationLogId, NotificationStatus},
};
use sari_infra::repository::NotificationLogFilter;
use sari_shared::PaginatedResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// 通知ログ一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct NotificationLogsQuery {
    pub merchant_id: Option<Uuid>,
    pub kind:        Option<NotificationKind>,
    pub status:      Option<NotificationStatus>,
    pub limit:       Option<i64>,
    pub cursor:      Option<Uuid>,
}

/// `GET /api/v1/admin/notification-logs?merchant_id&kind&status&limit&cursor`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationLogsQuery>,
) -> Result<Json<PaginatedResponse<NotificationLog>>, ApiError> {
    let filter = NotificationLogFilter {
        merchant_id: query.merchant_id.map(MerchantId::from_uuid),
        kind:        query.kind,
        status:      query.status,
    };
    let cursor = query.cursor.map(NotificationLogId::from_uuid);

    let page = state.logs.list(filter, query.limit, cursor).await?;
    Ok(Json(PaginatedResponse {
        data:        page.logs,
        next_cursor: page.next_cursor.map(|id| id.to_string()),
    }))
}
