//! # テスト用インメモリ実装
//!
//! リポジトリ・ゲートウェイトレイトのインメモリ実装を提供する。
//! `test-utils` フィーチャを有効にした依存クレートのテストから使用する。
//!
//! ## 設計方針
//!
//! - **共有状態**: 各モックは `Arc<Mutex<...>>` で状態を持ち、`Clone` で
//!   同じ状態を共有するハンドルが得られる（テストからの観測用）
//! - **本物と同じ不変条件**: ガード付き終端化・シングルトン・カスケード
//!   削除など、PostgreSQL 実装と同じ意味論を保つ

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sari_domain::{
    email::{DeliveryError, EmailLog, EmailLogId, EmailMessage, EmailStats, EmailStatus, NewEmailLog},
    merchant::{Merchant, MerchantId},
    notification::{
        GlobalNotificationSettings,
        NewNotificationLog,
        NotificationLog,
        NotificationLogId,
        NotificationPreference,
        NotificationStatus,
    },
    smtp::{SmtpConnection, SmtpSettings},
};

use crate::{
    error::InfraError,
    mailer::MailGateway,
    repository::{
        EmailLogRepository,
        MerchantRepository,
        NotificationLogFilter,
        NotificationLogRepository,
        NotificationPreferenceRepository,
        NotificationSettingsRepository,
        SmtpSettingsRepository,
        StatusTransition,
    },
};

// =========================================================================
// マーチャント
// =========================================================================

/// インメモリ MerchantRepository
///
/// [`cascade`](Self::cascade) で設定・ログのモックを接続すると、
/// `delete` 時に FK の `ON DELETE CASCADE` と同じ挙動を再現する。
#[derive(Clone, Default)]
pub struct MockMerchantRepository {
    merchants:   Arc<Mutex<Vec<Merchant>>>,
    preferences: Option<MockNotificationPreferenceRepository>,
    logs:        Option<MockNotificationLogRepository>,
    email_logs:  Option<MockEmailLogRepository>,
}

impl MockMerchantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// カスケード削除対象のモックを接続する
    pub fn cascade(
        mut self,
        preferences: MockNotificationPreferenceRepository,
        logs: MockNotificationLogRepository,
        email_logs: MockEmailLogRepository,
    ) -> Self {
        self.preferences = Some(preferences);
        self.logs = Some(logs);
        self.email_logs = Some(email_logs);
        self
    }

    /// テストセットアップ用: マーチャントを直接登録する
    pub fn seed(&self, merchant: Merchant) {
        self.merchants.lock().unwrap().push(merchant);
    }
}

#[async_trait]
impl MerchantRepository for MockMerchantRepository {
    async fn exists(&self, id: &MerchantId) -> Result<bool, InfraError> {
        Ok(self.merchants.lock().unwrap().iter().any(|m| &m.id == id))
    }

    async fn find_by_id(&self, id: &MerchantId) -> Result<Option<Merchant>, InfraError> {
        Ok(self
            .merchants
            .lock()
            .unwrap()
            .iter()
            .find(|m| &m.id == id)
            .cloned())
    }

    async fn insert(&self, merchant: &Merchant) -> Result<(), InfraError> {
        self.merchants.lock().unwrap().push(merchant.clone());
        Ok(())
    }

    async fn delete(&self, id: &MerchantId) -> Result<bool, InfraError> {
        let mut merchants = self.merchants.lock().unwrap();
        let before = merchants.len();
        merchants.retain(|m| &m.id != id);
        let deleted = merchants.len() < before;

        if deleted {
            if let Some(prefs) = &self.preferences {
                prefs
                    .preferences
                    .lock()
                    .unwrap()
                    .retain(|p| &p.merchant_id != id);
            }
            if let Some(logs) = &self.logs {
                logs.logs.lock().unwrap().retain(|l| &l.merchant_id != id);
            }
            if let Some(email_logs) = &self.email_logs {
                email_logs
                    .logs
                    .lock()
                    .unwrap()
                    .retain(|l| l.merchant_id.as_ref() != Some(id));
            }
        }
        Ok(deleted)
    }
}

// =========================================================================
// 通知設定
// =========================================================================

/// インメモリ NotificationPreferenceRepository
#[derive(Clone, Default)]
pub struct MockNotificationPreferenceRepository {
    preferences: Arc<Mutex<Vec<NotificationPreference>>>,
}

impl MockNotificationPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト観測用: 保存されている行数を返す
    pub fn row_count(&self) -> usize {
        self.preferences.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationPreferenceRepository for MockNotificationPreferenceRepository {
    async fn find_by_merchant(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Option<NotificationPreference>, InfraError> {
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.merchant_id == merchant_id)
            .cloned())
    }

    async fn upsert(&self, preference: &NotificationPreference) -> Result<(), InfraError> {
        let mut preferences = self.preferences.lock().unwrap();
        match preferences
            .iter_mut()
            .find(|p| p.merchant_id == preference.merchant_id)
        {
            Some(existing) => *existing = preference.clone(),
            None => preferences.push(preference.clone()),
        }
        Ok(())
    }
}

// =========================================================================
// 通知ログ
// =========================================================================

/// インメモリ NotificationLogRepository
#[derive(Clone, Default)]
pub struct MockNotificationLogRepository {
    logs: Arc<Mutex<Vec<NotificationLog>>>,
}

impl MockNotificationLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト観測用: 全ログのスナップショットを返す
    pub fn all(&self) -> Vec<NotificationLog> {
        self.logs.lock().unwrap().clone()
    }

    /// テスト観測用: 保存されている行数を返す
    pub fn row_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationLogRepository for MockNotificationLogRepository {
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
        self.logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn mark_sent(
        &self,
        id: &NotificationLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError> {
        let mut logs = self.logs.lock().unwrap();
        match logs
            .iter_mut()
            .find(|l| &l.id == id && l.status == NotificationStatus::Pending)
        {
            Some(log) => {
                log.status = NotificationStatus::Sent;
                log.sent_at = Some(sent_at);
                Ok(StatusTransition::Applied)
            }
            None => Ok(StatusTransition::AlreadyTerminal),
        }
    }

    async fn mark_failed(
        &self,
        id: &NotificationLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError> {
        let mut logs = self.logs.lock().unwrap();
        match logs
            .iter_mut()
            .find(|l| &l.id == id && l.status == NotificationStatus::Pending)
        {
            Some(log) => {
                log.status = NotificationStatus::Failed;
                log.error = Some(error.to_string());
                Ok(StatusTransition::Applied)
            }
            None => Ok(StatusTransition::AlreadyTerminal),
        }
    }

    async fn mark_cancelled(
        &self,
        id: &NotificationLogId,
    ) -> Result<StatusTransition, InfraError> {
        let mut logs = self.logs.lock().unwrap();
        match logs
            .iter_mut()
            .find(|l| &l.id == id && l.status == NotificationStatus::Pending)
        {
            Some(log) => {
                log.status = NotificationStatus::Cancelled;
                Ok(StatusTransition::Applied)
            }
            None => Ok(StatusTransition::AlreadyTerminal),
        }
    }

    async fn list(
        &self,
        filter: &NotificationLogFilter,
        limit: i64,
        cursor: Option<NotificationLogId>,
    ) -> Result<Vec<NotificationLog>, InfraError> {
        let logs = self.logs.lock().unwrap();
        let mut result: Vec<NotificationLog> = logs
            .iter()
            .filter(|l| {
                filter
                    .merchant_id
                    .as_ref()
                    .is_none_or(|id| &l.merchant_id == id)
                    && filter.kind.is_none_or(|k| l.kind == k)
                    && filter.status.is_none_or(|s| l.status == s)
                    && cursor.as_ref().is_none_or(|c| l.id.as_uuid() < c.as_uuid())
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| b.id.as_uuid().cmp(a.id.as_uuid()));
        result.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(result)
    }
}

// =========================================================================
// メールログ
// =========================================================================

/// インメモリ EmailLogRepository
#[derive(Clone, Default)]
pub struct MockEmailLogRepository {
    logs: Arc<Mutex<Vec<EmailLog>>>,
}

impl MockEmailLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト観測用: 全ログのスナップショットを返す
    pub fn all(&self) -> Vec<EmailLog> {
        self.logs.lock().unwrap().clone()
    }

    /// テスト観測用: 保存されている行数を返す
    pub fn row_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailLogRepository for MockEmailLogRepository {
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
        self.logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn mark_sent(
        &self,
        id: &EmailLogId,
        sent_at: DateTime<Utc>,
    ) -> Result<StatusTransition, InfraError> {
        let mut logs = self.logs.lock().unwrap();
        match logs
            .iter_mut()
            .find(|l| &l.id == id && l.status == EmailStatus::Pending)
        {
            Some(log) => {
                log.status = EmailStatus::Sent;
                log.sent_at = Some(sent_at);
                Ok(StatusTransition::Applied)
            }
            None => Ok(StatusTransition::AlreadyTerminal),
        }
    }

    async fn mark_failed(
        &self,
        id: &EmailLogId,
        error: &str,
    ) -> Result<StatusTransition, InfraError> {
        let mut logs = self.logs.lock().unwrap();
        match logs
            .iter_mut()
            .find(|l| &l.id == id && l.status == EmailStatus::Pending)
        {
            Some(log) => {
                log.status = EmailStatus::Failed;
                log.error = Some(error.to_string());
                Ok(StatusTransition::Applied)
            }
            None => Ok(StatusTransition::AlreadyTerminal),
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError> {
        let logs = self.logs.lock().unwrap();
        let mut result: Vec<EmailLog> = logs.clone();
        result.sort_by(|a, b| b.id.as_uuid().cmp(a.id.as_uuid()));
        result.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(result)
    }

    async fn stats(&self) -> Result<EmailStats, InfraError> {
        let logs = self.logs.lock().unwrap();
        let mut stats = EmailStats::default();
        for log in logs.iter() {
            match log.status {
                EmailStatus::Sent => stats.sent += 1,
                EmailStatus::Failed => stats.failed += 1,
                EmailStatus::Pending => stats.pending += 1,
            }
        }
        Ok(stats)
    }
}

// =========================================================================
// SMTP 設定
// =========================================================================

/// インメモリ SmtpSettingsRepository
#[derive(Clone, Default)]
pub struct MockSmtpSettingsRepository {
    settings: Arc<Mutex<Option<SmtpSettings>>>,
}

impl MockSmtpSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストセットアップ用: 設定を直接登録する
    pub fn seed(&self, settings: SmtpSettings) {
        *self.settings.lock().unwrap() = Some(settings);
    }
}

#[async_trait]
impl SmtpSettingsRepository for MockSmtpSettingsRepository {
    async fn find_active(&self) -> Result<Option<SmtpSettings>, InfraError> {
        Ok(self
            .settings
            .lock()
            .unwrap()
            .clone()
            .filter(|s| s.is_active))
    }

    async fn upsert(&self, settings: &SmtpSettings) -> Result<(), InfraError> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

// =========================================================================
// グローバル通知設定
// =========================================================================

/// インメモリ NotificationSettingsRepository
#[derive(Clone)]
pub struct MockNotificationSettingsRepository {
    settings: Arc<Mutex<GlobalNotificationSettings>>,
}

impl Default for MockNotificationSettingsRepository {
    fn default() -> Self {
        Self {
            settings: Arc::new(Mutex::new(GlobalNotificationSettings::default())),
        }
    }
}

impl MockNotificationSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストセットアップ用: 設定を直接登録する
    pub fn seed(&self, settings: GlobalNotificationSettings) {
        *self.settings.lock().unwrap() = settings;
    }
}

#[async_trait]
impl NotificationSettingsRepository for MockNotificationSettingsRepository {
    async fn get(&self) -> Result<GlobalNotificationSettings, InfraError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn upsert(&self, settings: &GlobalNotificationSettings) -> Result<(), InfraError> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

// =========================================================================
// メールゲートウェイ
// =========================================================================

/// 送信を記録するメールゲートウェイ
///
/// [`fail_with`](Self::fail_with) で失敗を注入できる。
#[derive(Clone, Default)]
pub struct MockMailGateway {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockMailGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の送信を指定の理由で失敗させる
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// テスト観測用: 送信されたメッセージのスナップショットを返す
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailGateway for MockMailGateway {
    async fn send(
        &self,
        _connection: &SmtpConnection,
        message: &EmailMessage,
    ) -> Result<(), DeliveryError> {
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(DeliveryError::Transport(reason));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
