//! EmailLogRepository: メールログの永続化
//!
//! SMTP 送信に特化した配信監査証跡。通知ログと同じログ先行プロトコルと
//! ガード付き終端化を適用する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sari_domain::{
    email::{EmailLog, EmailLogId, EmailStats, EmailStatus, NewEmailLog},
    merchant::MerchantId,
    value_objects::EmailAddress,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::StatusTransition;
use crate::error::InfraError;

/// EmailLogRepository トレイト
#[async_trait]
pub trait EmailLogRepository: Send + Sync {
    /// `pending` ステータスでログ行を挿入し、作成されたエンティティを返す
    async fn insert(&self, new: &NewEmailLog) -> Result<EmailLog, InfraError>;

    /// `pending` → `sent` に遷移させ、送信時刻を記録する
    async fn mark_sent(
        &self,
        id: &EmailLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError>;

    /// `pending` → `failed` に遷移させ、失敗理由を記録する
    async fn mark_failed(
        &self,
        id: &EmailLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError>;

    /// 直近のログを作成順の降順で取得する
    async fn list_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError>;

    /// ステータス別の件数を取得する
    async fn stats(&self) -> Result<EmailStats, InfraError>;
}

/// DB の email_logs テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct EmailLogRow {
    id:          Uuid,
    recipient:   String,
    subject:     String,
    body:        String,
    status:      String,
    error:       Option<String>,
    email_type:  Option<String>,
    merchant_id: Option<Uuid>,
    metadata:    Option<serde_json::Value>,
    sent_at:     Option<DateTime<Utc>>,
    created_at:  DateTime<Utc>,
}

impl TryFrom<EmailLogRow> for EmailLog {
    type Error = InfraError;

    fn try_from(row: EmailLogRow) -> Result<Self, Self::Error> {
        Ok(EmailLog {
            id:          EmailLogId::from_uuid(row.id),
            recipient:   EmailAddress::new(row.recipient)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            subject:     row.subject,
            body:        row.body,
            status:      row
                .status
                .parse::<EmailStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {e}")))?,
            error:       row.error,
            email_type:  row.email_type,
            merchant_id: row.merchant_id.map(MerchantId::from_uuid),
            metadata:    row.metadata,
            sent_at:     row.sent_at,
            created_at:  row.created_at,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresEmailLogRepository {
    pool: PgPool,
}

impl PostgresEmailLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailLogRepository for PostgresEmailLogRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, new: &NewEmailLog) -> Result<EmailLog, InfraError> {
        let log = EmailLog {
            id:          EmailLogId::new(),
            recipient:   new.recipient.clone(),
            subject:     new.subject.clone(),
            body:        new.body.clone(),
            status:      EmailStatus::Pending,
            error:       None,
            email_type:  new.email_type.clone(),
            merchant_id: new.merchant_id.clone(),
            metadata:    new.metadata.clone(),
            sent_at:     None,
            created_at:  Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO email_logs
                (id, recipient, subject, body, status, email_type, merchant_id, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.recipient.as_str())
        .bind(&log.subject)
        .bind(&log.body)
        .bind(log.status.to_string())
        .bind(log.email_type.as_deref())
        .bind(log.merchant_id.as_ref().map(|id| *id.as_uuid()))
        .bind(log.metadata.as_ref())
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(log)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn mark_sent(
        &self,
        id: &EmailLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError> {
        let result = sqlx::query(
            "UPDATE email_logs SET status = 'sent', sent_at = $2 \
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
        id: &EmailLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError> {
        let result = sqlx::query(
            "UPDATE email_logs SET status = 'failed', error = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_uuid())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(StatusTransition::from_rows_affected(result.rows_affected()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError> {
        let rows: Vec<EmailLogRow> = sqlx::query_as(
            r#"
            SELECT id, recipient, subject, body, status, error, email_type,
                   merchant_id, metadata, sent_at, created_at
            FROM email_logs
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EmailLog::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn stats(&self) -> Result<EmailStats, InfraError> {
        let (sent, failed, pending): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'sent'),
                COUNT(*) FILTER (WHERE status = 'failed'),
                COUNT(*) FILTER (WHERE status = 'pending')
            FROM email_logs
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(EmailStats {
            sent,
            failed,
            pending,
        })
    }
}
