//! NotificationLogRepository: 通知ログの永続化
//!
//! 追記専用の配信監査証跡。挿入は常に `pending` ステータスで行い、
//! 終端化は `WHERE status = 'pending'` ガード付き UPDATE で強制する。
//! ガードに弾かれた場合（すでに終端状態）は [`StatusTransition::AlreadyTerminal`]
//! を返し、呼び出し側が警告ログで可視化する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sari_domain::{
    merchant::MerchantId,
    notification::{
        DeliveryMethod,
        NewNotificationLog,
        NotificationKind,
        NotificationLog,
        NotificationLogId,
        NotificationStatus,
    },
};
use sqlx::PgPool;
use uuid::Uuid;

use super::StatusTransition;
use crate::error::InfraError;

/// 通知ログ一覧の絞り込み条件
#[derive(Debug, Clone, Default)]
pub struct NotificationLogFilter {
    pub merchant_id: Option<MerchantId>,
    pub kind:        Option<NotificationKind>,
    pub status:      Option<NotificationStatus>,
}

/// NotificationLogRepository トレイト
#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    /// `pending` ステータスでログ行を挿入し、作成されたエンティティを返す
    ///
    /// ゲートウェイ呼び出しの **前** に必ず呼ぶこと（ログ先行プロトコル）。
    async fn insert(&self, new: &NewNotificationLog) -> Result<NotificationLog, InfraError>;

    /// `pending` → `sent` に遷移させ、送信時刻を記録する
    async fn mark_sent(
        &self,
        id: &NotificationLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError>;

    /// `pending` → `failed` に遷移させ、失敗理由を記録する
    async fn mark_failed(
        &self,
        id: &NotificationLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError>;

    /// `pending` → `cancelled` に遷移させる
    async fn mark_cancelled(
        &self,
        id: &NotificationLogId,
    ) -> Result<StatusTransition, InfraError>;

    /// ログ一覧を作成順の降順で取得する（キーセットページネーション）
    ///
    /// `cursor` は前ページ最後の行の ID。UUID v7 が作成順に単調増加する
    /// 性質を利用し、`id < cursor` でページを切る。
    async fn list(
        &self,
        filter: &NotificationLogFilter,
        limit: i64,
        cursor: Option<NotificationLogId>,
    ) -> Result<Vec<NotificationLog>, InfraError>;
}

/// DB の notification_logs テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct NotificationLogRow {
    id:          Uuid,
    merchant_id: Uuid,
    kind:        String,
    method:      String,
    title:       String,
    body:        String,
    link:        Option<String>,
    status:      String,
    error:       Option<String>,
    metadata:    Option<serde_json::Value>,
    sent_at:     Option<DateTime<Utc>>,
    created_at:  DateTime<Utc>,
}

impl TryFrom<NotificationLogRow> for NotificationLog {
    type Error = InfraError;

    fn try_from(row: NotificationLogRow) -> Result<Self, Self::Error> {
        Ok(NotificationLog {
            id:          NotificationLogId::from_uuid(row.id),
            merchant_id: MerchantId::from_uuid(row.merchant_id),
            kind:        row
                .kind
                .parse::<NotificationKind>()
                .map_err(|e| InfraError::unexpected(format!("不正な通知種別: {e}")))?,
            method:      row
                .method
                .parse::<DeliveryMethod>()
                .map_err(|e| InfraError::unexpected(format!("不正な配信方法: {e}")))?,
            title:       row.title,
            body:        row.body,
            link:        row.link,
            status:      row
                .status
                .parse::<NotificationStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {e}")))?,
            error:       row.error,
            metadata:    row.metadata,
            sent_at:     row.sent_at,
            created_at:  row.created_at,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresNotificationLogRepository {
    pool: PgPool,
}

impl PostgresNotificationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationLogRepository for PostgresNotificationLogRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, new: &NewNotificationLog) -> Result<NotificationLog, InfraError> {
        let log = NotificationLog {
            id:          NotificationLogId::new(),
            merchant_id: new.merchant_id.clone(),
            kind:        new.kind,
            method:      new.method,
            title:       new.title.clone(),
            body:        new.body.clone(),
            link:        new.link.clone(),
            status:      NotificationStatus::Pending,
            error:       None,
            metadata:    new.metadata.clone(),
            sent_at:     None,
            created_at:  Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO notification_logs
                (id, merchant_id, kind, method, title, body, link, status, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.merchant_id.as_uuid())
        .bind(log.kind.to_string())
        .bind(log.method.to_string())
        .bind(&log.title)
        .bind(&log.body)
        .bind(log.link.as_deref())
        .bind(log.status.to_string())
        .bind(log.metadata.as_ref())
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(log)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn mark_sent(
        &self,
        id: &NotificationLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError> {
        let result = sqlx::query(
            "UPDATE notification_logs SET status = 'sent', sent_at = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_uuid())
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(StatusTransition::from_rows_affected(result.rows_affected()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn mark_failed(
        &self,
        id: &NotificationLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError> {
        let result = sqlx::query(
            "UPDATE notification_logs SET status = 'failed', error = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_uuid())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(StatusTransition::from_rows_affected(result.rows_affected()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn mark_cancelled(
        &self,
        id: &NotificationLogId,
    ) -> Result<StatusTransition, InfraError> {
        let result = sqlx::query(
            "UPDATE notification_logs SET status = 'cancelled' \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(StatusTransition::from_rows_affected(result.rows_affected()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list(
        &self,
        filter: &NotificationLogFilter,
        limit: i64,
        cursor: Option<NotificationLogId>,
    ) -> Result<Vec<NotificationLog>, InfraError> {
        let rows: Vec<NotificationLogRow> = sqlx::query_as(
            r#"
            SELECT id, merchant_id, kind, method, title, body, link, status,
                   error, metadata, sent_at, created_at
            FROM notification_logs
            WHERE ($1::uuid IS NULL OR merchant_id = $1)
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::uuid IS NULL OR id < $4)
            ORDER BY id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.merchant_id.as_ref().map(|id| *id.as_uuid()))
        .bind(filter.kind.map(|k| k.to_string()))
        .bind(filter.status.map(|s| s.to_string()))
        .bind(cursor.as_ref().map(|c| *c.as_uuid()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NotificationLog::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresNotificationLogRepository>();
    }
}
