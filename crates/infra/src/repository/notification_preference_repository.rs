//! NotificationPreferenceRepository: マーチャント通知設定の永続化
//!
//! マーチャントごとに最大 1 行。更新は
//! `INSERT ... ON CONFLICT (merchant_id) DO UPDATE` による upsert で、
//! 同一マーチャントへの並行更新は last-writer-wins となる
//! （行の原子性以上のロックは行わない）。

use async_trait::async_trait;
use sari_domain::{
    merchant::MerchantId,
    notification::{DeliveryMethod, NotificationPreference},
    value_objects::TimeOfDay,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// NotificationPreferenceRepository トレイト
#[async_trait]
pub trait NotificationPreferenceRepository: Send + Sync {
    /// マーチャントの通知設定を取得する
    ///
    /// 設定行が存在しない場合は `None` を返す。デフォルト値への
    /// フォールバックはユースケース層の責務。
    async fn find_by_merchant(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Option<NotificationPreference>, InfraError>;

    /// 通知設定を upsert する（last-writer-wins）
    async fn upsert(&self, preference: &NotificationPreference) -> Result<(), InfraError>;
}

/// DB の notification_preferences テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct PreferenceRow {
    merchant_id:            Uuid,
    new_orders:             bool,
    new_messages:           bool,
    appointments:           bool,
    order_status:           bool,
    missed_messages:        bool,
    whatsapp_disconnect:    bool,
    instant_notifications:  bool,
    batch_notifications:    bool,
    preferred_method:       String,
    quiet_hours_enabled:    bool,
    quiet_hours_start:      String,
    quiet_hours_end:        String,
    batch_interval_minutes: i32,
}

impl TryFrom<PreferenceRow> for NotificationPreference {
    type Error = InfraError;

    fn try_from(row: PreferenceRow) -> Result<Self, Self::Error> {
        Ok(NotificationPreference {
            merchant_id:            MerchantId::from_uuid(row.merchant_id),
            new_orders:             row.new_orders,
            new_messages:           row.new_messages,
            appointments:           row.appointments,
            order_status:           row.order_status,
            missed_messages:        row.missed_messages,
            whatsapp_disconnect:    row.whatsapp_disconnect,
            instant_notifications:  row.instant_notifications,
            batch_notifications:    row.batch_notifications,
            preferred_method:       row
                .preferred_method
                .parse::<DeliveryMethod>()
                .map_err(|e| InfraError::unexpected(format!("不正な配信方法: {e}")))?,
            quiet_hours_enabled:    row.quiet_hours_enabled,
            quiet_hours_start:      row
                .quiet_hours_start
                .parse::<TimeOfDay>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            quiet_hours_end:        row
                .quiet_hours_end
                .parse::<TimeOfDay>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            batch_interval_minutes: u16::try_from(row.batch_interval_minutes)
                .map_err(|_| {
                    InfraError::unexpected(format!(
                        "不正なバッチ間隔: {}",
                        row.batch_interval_minutes
                    ))
                })?,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresNotificationPreferenceRepository {
    pool: PgPool,
}

impl PostgresNotificationPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "merchant_id, new_orders, new_messages, appointments, \
     order_status, missed_messages, whatsapp_disconnect, instant_notifications, \
     batch_notifications, preferred_method, quiet_hours_enabled, quiet_hours_start, \
     quiet_hours_end, batch_interval_minutes";

#[async_trait]
impl NotificationPreferenceRepository for PostgresNotificationPreferenceRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_merchant(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Option<NotificationPreference>, InfraError> {
        let row: Option<PreferenceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM notification_preferences WHERE merchant_id = $1"
        ))
        .bind(merchant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(NotificationPreference::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, preference: &NotificationPreference) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO notification_preferences (
                merchant_id, new_orders, new_messages, appointments, order_status,
                missed_messages, whatsapp_disconnect, instant_notifications,
                batch_notifications, preferred_method, quiet_hours_enabled,
                quiet_hours_start, quiet_hours_end, batch_interval_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (merchant_id) DO UPDATE SET
                new_orders             = EXCLUDED.new_orders,
                new_messages           = EXCLUDED.new_messages,
                appointments           = EXCLUDED.appointments,
                order_status           = EXCLUDED.order_status,
                missed_messages        = EXCLUDED.missed_messages,
                whatsapp_disconnect    = EXCLUDED.whatsapp_disconnect,
                instant_notifications  = EXCLUDED.instant_notifications,
                batch_notifications    = EXCLUDED.batch_notifications,
                preferred_method       = EXCLUDED.preferred_method,
                quiet_hours_enabled    = EXCLUDED.quiet_hours_enabled,
                quiet_hours_start      = EXCLUDED.quiet_hours_start,
                quiet_hours_end        = EXCLUDED.quiet_hours_end,
                batch_interval_minutes = EXCLUDED.batch_interval_minutes,
                updated_at             = now()
            "#,
        )
        .bind(preference.merchant_id.as_uuid())
        .bind(preference.new_orders)
        .bind(preference.new_messages)
        .bind(preference.appointments)
        .bind(preference.order_status)
        .bind(preference.missed_messages)
        .bind(preference.whatsapp_disconnect)
        .bind(preference.instant_notifications)
        .bind(preference.batch_notifications)
        .bind(preference.preferred_method.to_string())
        .bind(preference.quiet_hours_enabled)
        .bind(preference.quiet_hours_start.to_string())
        .bind(preference.quiet_hours_end.to_string())
        .bind(i32::from(preference.batch_interval_minutes))
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
        assert_send_sync::<PostgresNotificationPreferenceRepository>();
    }
}
