//! NotificationSettingsRepository: グローバル通知設定の永続化
//!
//! シングルトン行。マイグレーションでシード行が作成されるため、
//! `get` は常に値を返す（行が無い場合はドメインのデフォルトに
//! フォールバックし、直後の upsert で復元される）。

use async_trait::async_trait;
use sari_domain::{
    notification::GlobalNotificationSettings,
    value_objects::{EmailAddress, TimeOfDay},
};
use sqlx::PgPool;

use crate::error::InfraError;

/// NotificationSettingsRepository トレイト
#[async_trait]
pub trait NotificationSettingsRepository: Send + Sync {
    /// グローバル通知設定を取得する
    async fn get(&self) -> Result<GlobalNotificationSettings, InfraError>;

    /// グローバル通知設定を upsert する
    async fn upsert(&self, settings: &GlobalNotificationSettings) -> Result<(), InfraError>;
}

/// DB の notification_settings テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct SettingsRow {
    new_orders:            bool,
    new_messages:          bool,
    appointments:          bool,
    order_status:          bool,
    missed_messages:       bool,
    whatsapp_disconnect:   bool,
    instant_notifications: bool,
    weekly_report:         bool,
    weekly_report_day:     i16,
    weekly_report_time:    String,
    admin_email:           Option<String>,
}

impl TryFrom<SettingsRow> for GlobalNotificationSettings {
    type Error = InfraError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        Ok(GlobalNotificationSettings {
            new_orders:            row.new_orders,
            new_messages:          row.new_messages,
            appointments:          row.appointments,
            order_status:          row.order_status,
            missed_messages:       row.missed_messages,
            whatsapp_disconnect:   row.whatsapp_disconnect,
            instant_notifications: row.instant_notifications,
            weekly_report:         row.weekly_report,
            weekly_report_day:     u8::try_from(row.weekly_report_day).map_err(|_| {
                InfraError::unexpected(format!("不正な曜日: {}", row.weekly_report_day))
            })?,
            weekly_report_time:    row
                .weekly_report_time
                .parse::<TimeOfDay>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            admin_email:           row
                .admin_email
                .map(EmailAddress::new)
                .transpose()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresNotificationSettingsRepository {
    pool: PgPool,
}

impl PostgresNotificationSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSettingsRepository for PostgresNotificationSettingsRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn get(&self) -> Result<GlobalNotificationSettings, InfraError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT new_orders, new_messages, appointments, order_status,
                   missed_messages, whatsapp_disconnect, instant_notifications,
                   weekly_report, weekly_report_day, weekly_report_time, admin_email
            FROM notification_settings
            WHERE id = TRUE
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => GlobalNotificationSettings::try_from(row),
            None => Ok(GlobalNotificationSettings::default()),
        }
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, settings: &GlobalNotificationSettings) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO notification_settings
                (id, new_orders, new_messages, appointments, order_status,
                 missed_messages, whatsapp_disconnect, instant_notifications,
                 weekly_report, weekly_report_day, weekly_report_time, admin_email)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                new_orders            = EXCLUDED.new_orders,
                new_messages          = EXCLUDED.new_messages,
                appointments          = EXCLUDED.appointments,
                order_status          = EXCLUDED.order_status,
                missed_messages       = EXCLUDED.missed_messages,
                whatsapp_disconnect   = EXCLUDED.whatsapp_disconnect,
                instant_notifications = EXCLUDED.instant_notifications,
                weekly_report         = EXCLUDED.weekly_report,
                weekly_report_day     = EXCLUDED.weekly_report_day,
                weekly_report_time    = EXCLUDED.weekly_report_time,
                admin_email           = EXCLUDED.admin_email,
                updated_at            = now()
            "#,
        )
        .bind(settings.new_orders)
        .bind(settings.new_messages)
        .bind(settings.appointments)
        .bind(settings.order_status)
        .bind(settings.missed_messages)
        .bind(settings.whatsapp_disconnect)
        .bind(settings.instant_notifications)
        .bind(settings.weekly_report)
        .bind(i16::from(settings.weekly_report_day))
        .bind(settings.weekly_report_time.to_string())
        .bind(settings.admin_email.as_ref().map(|e| e.as_str().to_string()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresNotificationSettingsRepository>();
    }
}
