//! マーチャント通知設定のユースケース
//!
//! 設定行を持たないマーチャントにはドメインのデフォルト値を返す。
//! 更新は部分更新のマージで、最後の書き込みが勝つ。

use std::sync::Arc;

use sari_domain::{
    DomainError,
    merchant::MerchantId,
    notification::{NotificationPreference, NotificationPreferenceUpdate},
};
use sari_infra::repository::{MerchantRepository, NotificationPreferenceRepository};
use sari_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// マーチャント通知設定のユースケース
pub struct PreferenceUseCase {
    merchants:   Arc<dyn MerchantRepository>,
    preferences: Arc<dyn NotificationPreferenceRepository>,
}

impl PreferenceUseCase {
    pub fn new(
        merchants: Arc<dyn MerchantRepository>,
        preferences: Arc<dyn NotificationPreferenceRepository>,
    ) -> Self {
        Self {
            merchants,
            preferences,
        }
    }

    /// マーチャントの存在を検証する
    async fn require_merchant(&self, merchant_id: &MerchantId) -> Result<(), ApiError> {
        if self.merchants.exists(merchant_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound {
                entity_type: "Merchant",
                id:          merchant_id.to_string(),
            }
            .into())
        }
    }

    /// 通知設定を取得する
    ///
    /// 設定行が存在しない場合はデフォルト値を返す（行は作成しない）。
    #[tracing::instrument(skip_all, fields(merchant_id = %merchant_id))]
    pub async fn get(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<NotificationPreference, ApiError> {
        self.require_merchant(merchant_id).await?;

        Ok(self
            .preferences
            .find_by_merchant(merchant_id)
            .await?
            .unwrap_or_else(|| NotificationPreference::defaults_for(merchant_id.clone())))
    }

    /// 通知設定を部分更新する
    ///
    /// 現在値（行が無ければデフォルト値）に更新をマージして upsert する。
    #[tracing::instrument(skip_all, fields(merchant_id = %merchant_id))]
    pub async fn update(
        &self,
        merchant_id: &MerchantId,
        update: NotificationPreferenceUpdate,
    ) -> Result<NotificationPreference, ApiError> {
        self.require_merchant(merchant_id).await?;

        let mut preference = self
            .preferences
            .find_by_merchant(merchant_id)
            .await?
            .unwrap_or_else(|| NotificationPreference::defaults_for(merchant_id.clone()));
        preference.apply(update)?;
        self.preferences.upsert(&preference).await?;

        log_business_event!(
            event.category = event::category::SETTINGS,
            event.action = event::action::PREFERENCES_UPDATED,
            event.result = event::result::SUCCESS,
            event.merchant_id = %merchant_id,
            event.entity_type = event::entity_type::NOTIFICATION_PREFERENCE,
        );

        Ok(preference)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use sari_domain::{
        merchant::{Merchant, MerchantName},
        notification::DeliveryMethod,
        value_objects::EmailAddress,
    };
    use sari_infra::mock::{MockMerchantRepository, MockNotificationPreferenceRepository};

    use super::*;

    fn setup() -> (PreferenceUseCase, MockNotificationPreferenceRepository, MerchantId) {
        let merchants = MockMerchantRepository::new();
        let preferences = MockNotificationPreferenceRepository::new();
        let merchant = Merchant {
            id:         MerchantId::new(),
            name:       MerchantName::new("Test Store").unwrap(),
            email:      EmailAddress::new("store@example.com").unwrap(),
            created_at: Utc::now(),
        };
        let merchant_id = merchant.id.clone();
        merchants.seed(merchant);

        let usecase = PreferenceUseCase::new(Arc::new(merchants), Arc::new(preferences.clone()));
        (usecase, preferences, merchant_id)
    }

    #[tokio::test]
    async fn test_設定行が無いマーチャントにはデフォルト値を返す() {
        let (usecase, preferences, merchant_id) = setup();

        let pref = usecase.get(&merchant_id).await.unwrap();

        assert_eq!(pref, NotificationPreference::defaults_for(merchant_id));
        // 読み取りでは行を作成しない
        assert_eq!(preferences.row_count(), 0);
    }

    #[tokio::test]
    async fn test_未知のマーチャントは404() {
        let (usecase, _, _) = setup();

        let result = usecase.get(&MerchantId::new()).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_部分更新はデフォルト値にマージして保存する() {
        let (usecase, preferences, merchant_id) = setup();

        let updated = usecase
            .update(
                &merchant_id,
                NotificationPreferenceUpdate {
                    new_orders: Some(false),
                    preferred_method: Some(DeliveryMethod::Email),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.new_orders);
        assert_eq!(updated.preferred_method, DeliveryMethod::Email);
        // 未指定のフィールドはデフォルト値のまま
        assert!(updated.new_messages);
        assert_eq!(preferences.row_count(), 1);

        // 2 回目の更新は保存済みの値にマージされる
        let second = usecase
            .update(
                &merchant_id,
                NotificationPreferenceUpdate {
                    quiet_hours_enabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!second.new_orders);
        assert!(second.quiet_hours_enabled);
        assert_eq!(preferences.row_count(), 1);
    }

    #[tokio::test]
    async fn test_検証エラー時は保存されない() {
        let (usecase, preferences, merchant_id) = setup();

        let result = usecase
            .update(
                &merchant_id,
                NotificationPreferenceUpdate {
                    batch_interval_minutes: Some(0),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(preferences.row_count(), 0);
    }
}
