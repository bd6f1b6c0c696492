//! # リポジトリ実装
//!
//! 通知設定・配信ログ・SMTP 設定の永続化トレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: トレイトを定義し、ユースケース層は `Arc<dyn Trait>` 経由で利用
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計（[`crate::mock`]）
//! - **単調なステータス遷移**: ログ行の終端化は `WHERE status = 'pending'`
//!   ガード付き UPDATE で強制し、結果を [`StatusTransition`] で報告する

pub mod email_log_repository;
pub mod merchant_repository;
pub mod notification_log_repository;
pub mod notification_preference_repository;
pub mod notification_settings_repository;
pub mod smtp_settings_repository;

pub use email_log_repository::{EmailLogRepository, PostgresEmailLogRepository};
pub use merchant_repository::{MerchantRepository, PostgresMerchantRepository};
pub use notification_log_repository::{
    NotificationLogFilter,
    NotificationLogRepository,
    PostgresNotificationLogRepository,
};
pub use notification_preference_repository::{
    NotificationPreferenceRepository,
    PostgresNotificationPreferenceRepository,
};
pub use notification_settings_repository::{
    NotificationSettingsRepository,
    PostgresNotificationSettingsRepository,
};
pub use smtp_settings_repository::{PostgresSmtpSettingsRepository, SmtpSettingsRepository};

/// ログ行のステータス遷移結果
///
/// `pending` 行への UPDATE が 0 行だった場合、行はすでに終端状態にある。
/// 呼び出し側はこれを警告ログで可視化する（黙って二重適用しない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// 遷移が適用された
    Applied,
    /// 行はすでに終端状態で、遷移は適用されなかった（冪等な no-op）
    AlreadyTerminal,
}

impl StatusTransition {
    /// UPDATE の影響行数から遷移結果を判定する
    pub(crate) fn from_rows_affected(rows: u64) -> Self {
        if rows > 0 {
            Self::Applied
        } else {
            Self::AlreadyTerminal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_影響行数から遷移結果を判定する() {
        assert_eq!(
            StatusTransition::from_rows_affected(1),
            StatusTransition::Applied
        );
        assert_eq!(
            StatusTransition::from_rows_affected(0),
            StatusTransition::AlreadyTerminal
        );
    }
}
