//! 通知ディスパッチのユースケース
//!
//! 内部 API から呼ばれる配信経路。キルスイッチの AND 結合と
//! ログ先行プロトコルを所有する。
//!
//! ## 配信判定
//!
//! 通知種別が配信可能なのは、グローバル設定とマーチャント設定の
//! **両方** で有効な場合のみ。抑止された通知はログ行を一切残さない
//! （構造化ログのビジネスイベントにのみ記録される）。
//!
//! ## 配信経路
//!
//! 通知ログ行そのものがプッシュ/アプリ内通知のレコードとなる。
//! 配信方法にメールが含まれる場合は、マーチャントの連絡先アドレスに
//! 宛てて SMTP 送信を行い、メールログにも記録する。

use std::sync::Arc;

use chrono::Utc;
use sari_domain::{
    DomainError,
    email::{EmailMessage, NewEmailLog},
    merchant::{Merchant, MerchantId},
    notification::{
        DeliveryMethod,
        NewNotificationLog,
        NotificationKind,
        NotificationLogId,
        NotificationPreference,
    },
};
use sari_infra::{
    crypto::SecretCipher,
    mailer::MailGateway,
    repository::{
        EmailLogRepository,
        MerchantRepository,
        NotificationLogRepository,
        NotificationPreferenceRepository,
        NotificationSettingsRepository,
        SmtpSettingsRepository,
        StatusTransition,
    },
};
use sari_shared::{event_log::event, log_business_event};

use super::decrypt_connection;
use crate::error::ApiError;

/// 通知メールの用途タグ
const EMAIL_TYPE_NOTIFICATION: &str = "notification";

/// ディスパッチ入力
#[derive(Debug, Clone)]
pub struct DispatchInput {
    pub merchant_id: MerchantId,
    pub kind:        NotificationKind,
    pub title:       String,
    pub body:        String,
    pub link:        Option<String>,
    pub metadata:    Option<serde_json::Value>,
}

/// ディスパッチ結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 配信された（通知ログ行が `sent` で終端）
    Dispatched { notification_id: NotificationLogId },
    /// キルスイッチまたはマーチャントトグルにより抑止された。
    /// ログ行は作成されない
    Suppressed,
}

/// 通知ディスパッチのユースケース
pub struct DispatchUseCase {
    merchants:         Arc<dyn MerchantRepository>,
    preferences:       Arc<dyn NotificationPreferenceRepository>,
    global_settings:   Arc<dyn NotificationSettingsRepository>,
    notification_logs: Arc<dyn NotificationLogRepository>,
    email_logs:        Arc<dyn EmailLogRepository>,
    smtp_settings:     Arc<dyn SmtpSettingsRepository>,
    gateway:           Arc<dyn MailGateway>,
    cipher:            Arc<SecretCipher>,
}

impl DispatchUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        merchants: Arc<dyn MerchantRepository>,
        preferences: Arc<dyn NotificationPreferenceRepository>,
        global_settings: Arc<dyn NotificationSettingsRepository>,
        notification_logs: Arc<dyn NotificationLogRepository>,
        email_logs: Arc<dyn EmailLogRepository>,
        smtp_settings: Arc<dyn SmtpSettingsRepository>,
        gateway: Arc<dyn MailGateway>,
        cipher: Arc<SecretCipher>,
    ) -> Self {
        Self {
            merchants,
            preferences,
            global_settings,
            notification_logs,
            email_logs,
            smtp_settings,
            gateway,
            cipher,
        }
    }

    /// 通知を配信する
    ///
    /// 1. マーチャントの存在を検証する
    /// 2. キルスイッチ（グローバル AND マーチャント）で配信可否を判定する
    /// 3. `pending` の通知ログ行を永続化する
    /// 4. 配信方法にメールが含まれる場合は SMTP 送信する
    /// 5. 結果で通知ログ行を終端化する
    #[tracing::instrument(skip_all, fields(merchant_id = %input.merchant_id, kind = %input.kind))]
    pub async fn dispatch(&self, input: DispatchInput) -> Result<DispatchOutcome, ApiError> {
        let merchant = self
            .merchants
            .find_by_id(&input.merchant_id)
            .await?
            .ok_or_else(|| {
                ApiError::from(DomainError::NotFound {
                    entity_type: "Merchant",
                    id:          input.merchant_id.to_string(),
                })
            })?;

        let global = self.global_settings.get().await?;
        let preference = self
            .preferences
            .find_by_merchant(&input.merchant_id)
            .await?
            .unwrap_or_else(|| NotificationPreference::defaults_for(input.merchant_id.clone()));

        // キルスイッチ: 両方有効な場合のみ配信する
        if !(global.kind_enabled(input.kind) && preference.kind_enabled(input.kind)) {
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SUPPRESSED,
                event.result = event::result::SUPPRESSED,
                event.merchant_id = %input.merchant_id,
                kind = %input.kind,
            );
            return Ok(DispatchOutcome::Suppressed);
        }

        let method = preference.preferred_method;
        let log = self
            .notification_logs
            .insert(&NewNotificationLog {
                merchant_id: input.merchant_id.clone(),
                kind:        input.kind,
                method,
                title:       input.title.clone(),
                body:        input.body.clone(),
                link:        input.link.clone(),
                metadata:    input.metadata.clone(),
            })
            .await?;

        if method != DeliveryMethod::Push
            && let Err(err) = self.deliver_email(&merchant, &input, method).await
        {
            let reason = err.to_string();
            if let Err(mark_error) = self.notification_logs.mark_failed(&log.id, &reason).await {
                tracing::error!(
                    notification_log_id = %log.id,
                    error = %mark_error,
                    "失敗ステータスの記録に失敗"
                );
            }
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.result = event::result::FAILURE,
                event.merchant_id = %input.merchant_id,
                event.entity_type = event::entity_type::NOTIFICATION_LOG,
                event.entity_id = %log.id,
            );
            // 失敗理由はログにのみ残し、呼び出し元には汎用エラーを返す
            return Err(ApiError::Internal("通知の配信に失敗しました".to_string()));
        }

        if self.notification_logs.mark_sent(&log.id, Utc::now()).await?
            == StatusTransition::AlreadyTerminal
        {
            tracing::warn!(notification_log_id = %log.id, "通知ログはすでに終端状態");
        }
        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_DISPATCHED,
            event.result = event::result::SUCCESS,
            event.merchant_id = %input.merchant_id,
            event.entity_type = event::entity_type::NOTIFICATION_LOG,
            event.entity_id = %log.id,
        );

        Ok(DispatchOutcome::Dispatched {
            notification_id: log.id,
        })
    }

    /// メール経路の配信
    ///
    /// 配信方法が `email` の場合は SMTP 設定が必須。`both` の場合は
    /// SMTP 未設定を許容し、プッシュ記録のみで成功とする。
    async fn deliver_email(
        &self,
        merchant: &Merchant,
        input: &DispatchInput,
        method: DeliveryMethod,
    ) -> Result<(), ApiError> {
        let Some(settings) = self.smtp_settings.find_active().await? else {
            if method == DeliveryMethod::Email {
                return Err(ApiError::Internal(
                    "SMTP 設定が存在しないためメール配信できません".to_string(),
                ));
            }
            tracing::debug!("SMTP 未設定のためメール経路をスキップ");
            return Ok(());
        };
        let connection = decrypt_connection(&settings, &self.cipher)?;

        let mut text_body = input.body.clone();
        if let Some(link) = &input.link {
            text_body.push_str("\n\n");
            text_body.push_str(link);
        }
        let message = EmailMessage {
            to:        merchant.email.clone(),
            subject:   input.title.clone(),
            text_body,
            html_body: None,
        };

        // ログ先行: 送信前に pending 行を永続化する
        let email_log = self
            .email_logs
            .insert(&NewEmailLog {
                recipient:   message.to.clone(),
                subject:     message.subject.clone(),
                body:        message.text_body.clone(),
                email_type:  Some(EMAIL_TYPE_NOTIFICATION.to_string()),
                merchant_id: Some(input.merchant_id.clone()),
                metadata:    input.metadata.clone(),
            })
            .await?;

        match self.gateway.send(&connection, &message).await {
            Ok(()) => {
                if self.email_logs.mark_sent(&email_log.id, Utc::now()).await?
                    == StatusTransition::AlreadyTerminal
                {
                    tracing::warn!(email_log_id = %email_log.id, "メールログはすでに終端状態");
                }
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_SENT,
                    event.result = event::result::SUCCESS,
                    event.merchant_id = %input.merchant_id,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %email_log.id,
                );
                Ok(())
            }
            Err(delivery_error) => {
                let reason = delivery_error.to_string();
                if let Err(mark_error) =
                    self.email_logs.mark_failed(&email_log.id, &reason).await
                {
                    tracing::error!(
                        email_log_id = %email_log.id,
                        error = %mark_error,
                        "失敗ステータスの記録に失敗"
                    );
                }
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_FAILED,
                    event.result = event::result::FAILURE,
                    event.merchant_id = %input.merchant_id,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %email_log.id,
                );
                Err(ApiError::Internal(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use sari_domain::{
        email::EmailStatus,
        merchant::MerchantName,
        notification::{
            GlobalNotificationSettings,
            NotificationPreferenceUpdate,
            NotificationStatus,
        },
        smtp::SmtpSettingsInput,
        value_objects::EmailAddress,
    };
    use sari_infra::mock::{
        MockEmailLogRepository,
        MockMailGateway,
        MockMerchantRepository,
        MockNotificationLogRepository,
        MockNotificationPreferenceRepository,
        MockNotificationSettingsRepository,
        MockSmtpSettingsRepository,
    };

    use super::*;
    use crate::usecase::SmtpUseCase;

    struct Fixture {
        usecase:       DispatchUseCase,
        merchants:     MockMerchantRepository,
        preferences:   MockNotificationPreferenceRepository,
        settings:      MockNotificationSettingsRepository,
        logs:          MockNotificationLogRepository,
        email_logs:    MockEmailLogRepository,
        smtp_settings: MockSmtpSettingsRepository,
        gateway:       MockMailGateway,
        cipher:        Arc<SecretCipher>,
        merchant_id:   MerchantId,
    }

    fn setup() -> Fixture {
        let merchants = MockMerchantRepository::new();
        let preferences = MockNotificationPreferenceRepository::new();
        let settings = MockNotificationSettingsRepository::new();
        let logs = MockNotificationLogRepository::new();
        let email_logs = MockEmailLogRepository::new();
        let smtp_settings = MockSmtpSettingsRepository::new();
        let gateway = MockMailGateway::new();
        let cipher = Arc::new(SecretCipher::generate());

        let merchant = Merchant {
            id:         MerchantId::new(),
            name:       MerchantName::new("Test Store").unwrap(),
            email:      EmailAddress::new("store@example.com").unwrap(),
            created_at: Utc::now(),
        };
        let merchant_id = merchant.id.clone();
        merchants.seed(merchant);

        let usecase = DispatchUseCase::new(
            Arc::new(merchants.clone()),
            Arc::new(preferences.clone()),
            Arc::new(settings.clone()),
            Arc::new(logs.clone()),
            Arc::new(email_logs.clone()),
            Arc::new(smtp_settings.clone()),
            Arc::new(gateway.clone()),
            cipher.clone(),
        );

        Fixture {
            usecase,
            merchants,
            preferences,
            settings,
            logs,
            email_logs,
            smtp_settings,
            gateway,
            cipher,
            merchant_id,
        }
    }

    /// SMTP 設定を暗号化済みパスワードつきでシードする
    async fn seed_smtp(fixture: &Fixture) {
        let smtp = SmtpUseCase::new(
            Arc::new(fixture.smtp_settings.clone()),
            Arc::new(fixture.email_logs.clone()),
            Arc::new(fixture.gateway.clone()),
            fixture.cipher.clone(),
        );
        smtp.update_settings(SmtpSettingsInput {
            host:       "smtp.example.com".to_string(),
            port:       None,
            username:   "user".to_string(),
            password:   Some("secret".to_string()),
            from_email: EmailAddress::new("noreply@example.com").unwrap(),
            from_name:  None,
        })
        .await
        .unwrap();
    }

    fn input(merchant_id: &MerchantId) -> DispatchInput {
        DispatchInput {
            merchant_id: merchant_id.clone(),
            kind:        NotificationKind::NewOrder,
            title:       "新規注文".to_string(),
            body:        "注文が入りました".to_string(),
            link:        None,
            metadata:    None,
        }
    }

    #[tokio::test]
    async fn test_配信成功で通知ログとメールログがsentになる() {
        let fixture = setup();
        seed_smtp(&fixture).await;

        let outcome = fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));

        let logs = fixture.logs.all();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, NotificationStatus::Sent);
        assert!(logs[0].sent_at.is_some());

        let email_logs = fixture.email_logs.all();
        assert_eq!(email_logs.len(), 1);
        assert_eq!(email_logs[0].status, EmailStatus::Sent);
        assert_eq!(email_logs[0].email_type.as_deref(), Some("notification"));
        assert_eq!(email_logs[0].merchant_id, Some(fixture.merchant_id.clone()));

        // メールはマーチャントの連絡先アドレスに送信される
        let sent = fixture.gateway.sent_messages();
        assert_eq!(sent[0].to.as_str(), "store@example.com");
        assert_eq!(sent[0].subject, "新規注文");
    }

    #[tokio::test]
    async fn test_グローバルキルスイッチで抑止されログ行が作成されない() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        fixture.settings.seed(GlobalNotificationSettings {
            new_orders: false,
            ..Default::default()
        });

        let outcome = fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert_eq!(fixture.logs.row_count(), 0);
        assert_eq!(fixture.email_logs.row_count(), 0);
        assert!(fixture.gateway.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_マーチャントトグルで抑止される() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        let mut pref = NotificationPreference::defaults_for(fixture.merchant_id.clone());
        pref.apply(NotificationPreferenceUpdate {
            new_orders: Some(false),
            ..Default::default()
        })
        .unwrap();
        fixture.preferences.upsert(&pref).await.unwrap();

        let outcome = fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert_eq!(fixture.logs.row_count(), 0);
    }

    #[tokio::test]
    async fn test_送信失敗で通知ログがfailedになり汎用エラーを返す() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        fixture.gateway.fail_with("connection refused");

        let result = fixture.usecase.dispatch(input(&fixture.merchant_id)).await;

        match result {
            Err(ApiError::Internal(detail)) => {
                // 失敗理由は呼び出し元に開示されない
                assert!(!detail.contains("connection refused"));
            }
            other => panic!("Internal を期待したが {other:?} だった"),
        }

        let logs = fixture.logs.all();
        assert_eq!(logs[0].status, NotificationStatus::Failed);

        let email_logs = fixture.email_logs.all();
        assert_eq!(email_logs[0].status, EmailStatus::Failed);
        assert_eq!(email_logs[0].error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_未知のマーチャントは404でログ行が作成されない() {
        let fixture = setup();
        seed_smtp(&fixture).await;

        let result = fixture.usecase.dispatch(input(&MerchantId::new())).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(fixture.logs.row_count(), 0);
    }

    #[tokio::test]
    async fn test_push設定のマーチャントはメールを送信しない() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        let mut pref = NotificationPreference::defaults_for(fixture.merchant_id.clone());
        pref.preferred_method = DeliveryMethod::Push;
        fixture.preferences.upsert(&pref).await.unwrap();

        let outcome = fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(fixture.logs.all()[0].status, NotificationStatus::Sent);
        // メール経路は使われない
        assert_eq!(fixture.email_logs.row_count(), 0);
        assert!(fixture.gateway.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_smtp未設定でemail指定の配信は失敗として記録される() {
        let fixture = setup();
        let mut pref = NotificationPreference::defaults_for(fixture.merchant_id.clone());
        pref.preferred_method = DeliveryMethod::Email;
        fixture.preferences.upsert(&pref).await.unwrap();

        let result = fixture.usecase.dispatch(input(&fixture.merchant_id)).await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert_eq!(fixture.logs.all()[0].status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_smtp未設定でbothの配信はプッシュ記録のみで成功する() {
        let fixture = setup();

        let outcome = fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
        assert_eq!(fixture.logs.all()[0].status, NotificationStatus::Sent);
        assert_eq!(fixture.email_logs.row_count(), 0);
    }

    #[tokio::test]
    async fn test_週次レポートはグローバルフラグのみで判定される() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        // マーチャントの種別トグルをすべて無効化しても週次レポートは配信される
        let mut pref = NotificationPreference::defaults_for(fixture.merchant_id.clone());
        pref.new_orders = false;
        pref.new_messages = false;
        fixture.preferences.upsert(&pref).await.unwrap();

        let mut weekly = input(&fixture.merchant_id);
        weekly.kind = NotificationKind::WeeklyReport;
        let outcome = fixture.usecase.dispatch(weekly).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
    }

    #[tokio::test]
    async fn test_マーチャント削除で配信ログがカスケード削除される() {
        let fixture = setup();
        seed_smtp(&fixture).await;
        fixture
            .usecase
            .dispatch(input(&fixture.merchant_id))
            .await
            .unwrap();
        assert_eq!(fixture.logs.row_count(), 1);

        // カスケード接続つきのマーチャントリポジトリで削除を再現する
        let merchants = MockMerchantRepository::new().cascade(
            fixture.preferences.clone(),
            fixture.logs.clone(),
            fixture.email_logs.clone(),
        );
        let merchant = fixture
            .merchants
            .find_by_id(&fixture.merchant_id)
            .await
            .unwrap()
            .unwrap();
        merchants.insert(&merchant).await.unwrap();
        assert!(merchants.delete(&fixture.merchant_id).await.unwrap());

        assert_eq!(fixture.logs.row_count(), 0);
        assert_eq!(fixture.email_logs.row_count(), 0);
    }
}
