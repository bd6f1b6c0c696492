//! SmtpSettingsRepository: SMTP 設定の永続化
//!
//! `id = TRUE` の CHECK 制約によりシングルトン行を強制する。
//! パスワードは呼び出し側（ユースケース層）で暗号化済みの値を受け取り、
//! このリポジトリは平文パスワードに触れない。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sari_domain::{smtp::SmtpSettings, value_objects::EmailAddress};
use sqlx::PgPool;

use crate::error::InfraError;

/// SmtpSettingsRepository トレイト
#[async_trait]
pub trait SmtpSettingsRepository: Send + Sync {
    /// 有効な SMTP 設定を取得する
    ///
    /// 設定が未登録、または `is_active = FALSE` の場合は `None` を返す。
    async fn find_active(&self) -> Result<Option<SmtpSettings>, InfraError>;

    /// SMTP 設定を upsert する（シングルトン行の置き換え）
    async fn upsert(&self, settings: &SmtpSettings) -> Result<(), InfraError>;
}

/// DB の smtp_settings テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct SmtpSettingsRow {
    host:               String,
    port:               i32,
    username:           String,
    password_encrypted: String,
    from_email:         String,
    from_name:          String,
    is_active:          bool,
    updated_at:         DateTime<Utc>,
}

impl TryFrom<SmtpSettingsRow> for SmtpSettings {
    type Error = InfraError;

    fn try_from(row: SmtpSettingsRow) -> Result<Self, Self::Error> {
        Ok(SmtpSettings {
            host:               row.host,
            port:               u16::try_from(row.port)
                .map_err(|_| InfraError::unexpected(format!("不正なポート: {}", row.port)))?,
            username:           row.username,
            password_encrypted: row.password_encrypted,
            from_email:         EmailAddress::new(row.from_email)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            from_name:          row.from_name,
            is_active:          row.is_active,
            updated_at:         row.updated_at,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresSmtpSettingsRepository {
    pool: PgPool,
}

impl PostgresSmtpSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SmtpSettingsRepository for PostgresSmtpSettingsRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(&self) -> Result<Option<SmtpSettings>, InfraError> {
        let row: Option<SmtpSettingsRow> = sqlx::query_as(
            r#"
            SELECT host, port, username, password_encrypted, from_email,
                   from_name, is_active, updated_at
            FROM smtp_settings
            WHERE id = TRUE AND is_active = TRUE
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(SmtpSettings::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, settings: &SmtpSettings) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO smtp_settings
                (id, host, port, username, password_encrypted, from_email, from_name, is_active)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                host               = EXCLUDED.host,
                port               = EXCLUDED.port,
                username           = EXCLUDED.username,
                password_encrypted = EXCLUDED.password_encrypted,
                from_email         = EXCLUDED.from_email,
                from_name          = EXCLUDED.from_name,
                is_active          = EXCLUDED.is_active,
                updated_at         = now()
            "#,
        )
        .bind(&settings.host)
        .bind(i32::from(settings.port))
        .bind(&settings.username)
        .bind(&settings.password_encrypted)
        .bind(settings.from_email.as_str())
        .bind(&settings.from_name)
        .bind(settings.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
