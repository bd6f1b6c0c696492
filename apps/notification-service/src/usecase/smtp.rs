//! SMTP 設定・テスト送信・メールログのユースケース
//!
//! ## 設計方針
//!
//! - **パスワードは書き込み専用**: 入力の平文パスワードは暗号化して
//!   保存する。入力が `None` の場合は保存済みの暗号化パスワードを維持する
//! - **テスト送信もログ先行**: ゲートウェイ呼び出しの前に `pending` の
//!   メールログ行を永続化し、結果で終端化する。失敗理由は管理者向けに
//!   そのまま開示される（唯一の開示経路）

use std::sync::Arc;

use chrono::Utc;
use sari_domain::{
    DomainError,
    email::{EmailLog, EmailMessage, EmailStats, NewEmailLog},
    smtp::{SmtpSettings, SmtpSettingsInput},
    value_objects::EmailAddress,
};
use sari_infra::{
    crypto::SecretCipher,
    mailer::MailGateway,
    repository::{EmailLogRepository, SmtpSettingsRepository, StatusTransition},
};
use sari_shared::{event_log::event, log_business_event};

use super::decrypt_connection;
use crate::error::ApiError;

/// テスト送信のメール種別タグ
const EMAIL_TYPE_SMTP_TEST: &str = "smtp_test";

/// SMTP 設定・テスト送信・メールログのユースケース
pub struct SmtpUseCase {
    smtp_settings: Arc<dyn SmtpSettingsRepository>,
    email_logs:    Arc<dyn EmailLogRepository>,
    gateway:       Arc<dyn MailGateway>,
    cipher:        Arc<SecretCipher>,
}

impl SmtpUseCase {
    pub fn new(
        smtp_settings: Arc<dyn SmtpSettingsRepository>,
        email_logs: Arc<dyn EmailLogRepository>,
        gateway: Arc<dyn MailGateway>,
        cipher: Arc<SecretCipher>,
    ) -> Self {
        Self {
            smtp_settings,
            email_logs,
            gateway,
            cipher,
        }
    }

    /// 有効な SMTP 設定を取得する
    ///
    /// 返り値にはパスワードが暗号化された形で含まれるため、
    /// ハンドラ側で必ずマスク済み DTO に変換すること。
    #[tracing::instrument(skip_all)]
    pub async fn get_settings(&self) -> Result<Option<SmtpSettings>, ApiError> {
        Ok(self.smtp_settings.find_active().await?)
    }

    /// SMTP 設定を更新する
    ///
    /// パスワードが入力に含まれる場合は暗号化して保存し、
    /// `None` の場合は保存済みの暗号化パスワードを維持する。
    #[tracing::instrument(skip_all)]
    pub async fn update_settings(&self, input: SmtpSettingsInput) -> Result<(), ApiError> {
        input.validate()?;

        let password_encrypted = match &input.password {
            Some(password) => self.cipher.encrypt_string(password)?,
            None => self
                .smtp_settings
                .find_active()
                .await?
                .map(|existing| existing.password_encrypted)
                .ok_or_else(|| {
                    DomainError::Validation("初回設定時はパスワードが必須です".to_string())
                })?,
        };

        let settings = SmtpSettings {
            host: input.host.trim().to_string(),
            port: input.port_or_default(),
            username: input.username.trim().to_string(),
            password_encrypted,
            from_email: input.from_email.clone(),
            from_name: input.from_name_or_default(),
            is_active: true,
            updated_at: Utc::now(),
        };
        self.smtp_settings.upsert(&settings).await?;

        log_business_event!(
            event.category = event::category::SMTP,
            event.action = event::action::SMTP_SETTINGS_UPDATED,
            event.result = event::result::SUCCESS,
            event.entity_type = event::entity_type::SMTP_SETTINGS,
        );

        Ok(())
    }

    /// テストメールを送信する
    ///
    /// 結果にかかわらずメールログ行がちょうど 1 行作成される。
    /// 失敗時は [`ApiError::DeliveryFailed`] で失敗理由をそのまま返す
    /// （管理者専用エンドポイントからのみ呼ばれる）。
    #[tracing::instrument(skip_all)]
    pub async fn send_test(&self, to: EmailAddress) -> Result<(), ApiError> {
        let settings = self.smtp_settings.find_active().await?.ok_or_else(|| {
            ApiError::from(DomainError::NotFound {
                entity_type: "SmtpSettings",
                id:          "active".to_string(),
            })
        })?;
        let connection = decrypt_connection(&settings, &self.cipher)?;

        let message = EmailMessage {
            to,
            subject: "Sari SMTP 設定テスト".to_string(),
            text_body: "このメールは SMTP 設定の確認のために送信されました。".to_string(),
            html_body: None,
        };

        // ログ先行: 送信前に pending 行を永続化する
        let log = self
            .email_logs
            .insert(&NewEmailLog {
                recipient:   message.to.clone(),
                subject:     message.subject.clone(),
                body:        message.text_body.clone(),
                email_type:  Some(EMAIL_TYPE_SMTP_TEST.to_string()),
                merchant_id: None,
                metadata:    None,
            })
            .await?;

        match self.gateway.send(&connection, &message).await {
            Ok(()) => {
                if self.email_logs.mark_sent(&log.id, Utc::now()).await?
                    == StatusTransition::AlreadyTerminal
                {
                    tracing::warn!(email_log_id = %log.id, "メールログはすでに終端状態");
                }
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_TEST_SENT,
                    event.result = event::result::SUCCESS,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %log.id,
                );
                Ok(())
            }
            Err(delivery_error) => {
                let reason = delivery_error.to_string();
                if let Err(mark_error) = self.email_logs.mark_failed(&log.id, &reason).await {
                    tracing::error!(
                        email_log_id = %log.id,
                        error = %mark_error,
                        "失敗ステータスの記録に失敗"
                    );
                }
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_FAILED,
                    event.result = event::result::FAILURE,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %log.id,
                );
                Err(ApiError::DeliveryFailed(reason))
            }
        }
    }

    /// 直近のメールログを取得する
    #[tracing::instrument(skip_all)]
    pub async fn recent_logs(&self, limit: i64) -> Result<Vec<EmailLog>, ApiError> {
        Ok(self.email_logs.list_recent(limit).await?)
    }

    /// メール配信統計を取得する
    #[tracing::instrument(skip_all)]
    pub async fn stats(&self) -> Result<EmailStats, ApiError> {
        Ok(self.email_logs.stats().await?)
    }
}
