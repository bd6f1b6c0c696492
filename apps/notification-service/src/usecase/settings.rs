//! グローバル通知設定のユースケース
//!
//! シングルトンのマスタースイッチ。更新は部分更新のマージ。

use std::sync::Arc;

use sari_domain::notification::{GlobalNotificationSettings, GlobalNotificationSettingsUpdate};
use sari_infra::repository::NotificationSettingsRepository;
use sari_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// グローバル通知設定のユースケース
pub struct SettingsUseCase {
    settings: Arc<dyn NotificationSettingsRepository>,
}

impl SettingsUseCase {
    pub fn new(settings: Arc<dyn NotificationSettingsRepository>) -> Self {
        Self { settings }
    }

    /// グローバル通知設定を取得する
    #[tracing::instrument(skip_all)]
    pub async fn get(&self) -> Result<GlobalNotificationSettings, ApiError> {
        Ok(self.settings.get().await?)
    }

    /// グローバル通知設定を部分更新する
    #[tracing::instrument(skip_all)]
    pub async fn update(
        &self,
        update: GlobalNotificationSettingsUpdate,
    ) -> Result<GlobalNotificationSettings, ApiError> {
        let mut settings = self.settings.get().await?;
        settings.apply(update)?;
        self.settings.upsert(&settings).await?;

        log_business_event!(
            event.category = event::category::SETTINGS,
            event.action = event::action::GLOBAL_SETTINGS_UPDATED,
            event.result = event::result::SUCCESS,
        );

        Ok(settings)
    }
}
