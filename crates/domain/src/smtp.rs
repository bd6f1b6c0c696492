//! # SMTP 設定
//!
//! メール送信に使用する SMTP 接続設定のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **パスワードは書き込み専用**: API の読み取り経路では常に
//!   マスクされる。永続化時は AES-256-GCM で暗号化される
//!   （暗号化はインフラ層の責務）
//! - **シングルトン**: 有効な設定はシステム全体で常に 1 件
//! - **復号は送信経路のみ**: 復号済みの [`SmtpConnection`] は
//!   ゲートウェイの送信処理にのみ渡され、API 境界を越えない

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, value_objects::EmailAddress};

/// SMTP ポートのデフォルト値（STARTTLS）
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// 送信者表示名のデフォルト値
pub const DEFAULT_FROM_NAME: &str = "Sari";

/// SMTP 設定（エンティティ、永続化形）
///
/// パスワードは暗号化された形でのみ保持する。平文パスワードが
/// 必要なのは送信直前だけで、その復号はインフラ層で行われる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host:               String,
    pub port:               u16,
    pub username:           String,
    /// AES-256-GCM で暗号化されたパスワード（base64）
    pub password_encrypted: String,
    pub from_email:         EmailAddress,
    pub from_name:          String,
    pub is_active:          bool,
    pub updated_at:         DateTime<Utc>,
}

/// SMTP 設定の更新入力
///
/// `password` が `None` の場合、保存済みの暗号化パスワードを維持する
/// （パスワードを変更しない設定更新を可能にするため）。
#[derive(Clone, Deserialize)]
pub struct SmtpSettingsInput {
    pub host:       String,
    pub port:       Option<u16>,
    pub username:   String,
    pub password:   Option<String>,
    pub from_email: EmailAddress,
    pub from_name:  Option<String>,
}

impl SmtpSettingsInput {
    /// 入力値を検証する
    ///
    /// # エラー
    ///
    /// ホストが空、ポートが 0、ユーザー名が空の場合は
    /// `DomainError::Validation` を返す。
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.host.trim().is_empty() {
            return Err(DomainError::Validation(
                "SMTP ホストは必須です".to_string(),
            ));
        }
        if self.port == Some(0) {
            return Err(DomainError::Validation(
                "SMTP ポートは 1〜65535 の範囲である必要があります".to_string(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(DomainError::Validation(
                "SMTP ユーザー名は必須です".to_string(),
            ));
        }
        Ok(())
    }

    /// ポート（未指定時は 587）
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    /// 送信者表示名（未指定時は "Sari"）
    pub fn from_name_or_default(&self) -> String {
        self.from_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string())
    }
}

impl std::fmt::Debug for SmtpSettingsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettingsInput")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| crate::REDACTED))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// 復号済み SMTP 接続情報
///
/// ゲートウェイの送信処理にのみ渡される。`Debug` 出力では
/// パスワードがマスクされる。
#[derive(Clone)]
pub struct SmtpConnection {
    pub host:       String,
    pub port:       u16,
    pub username:   String,
    pub password:   String,
    pub from_email: EmailAddress,
    pub from_name:  String,
}

impl std::fmt::Debug for SmtpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &crate::REDACTED)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn input() -> SmtpSettingsInput {
        SmtpSettingsInput {
            host:       "smtp.example.com".to_string(),
            port:       Some(587),
            username:   "user".to_string(),
            password:   Some("secret".to_string()),
            from_email: EmailAddress::new("noreply@example.com").unwrap(),
            from_name:  None,
        }
    }

    #[test]
    fn test_正常な入力は検証を通過する() {
        assert!(input().validate().is_ok());
    }

    #[rstest]
    #[case::空ホスト("", "user")]
    #[case::空白ホスト("   ", "user")]
    #[case::空ユーザー名("smtp.example.com", "")]
    fn test_不正な入力を拒否する(#[case] host: &str, #[case] username: &str) {
        let mut i = input();
        i.host = host.to_string();
        i.username = username.to_string();
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_ポート0を拒否する() {
        let mut i = input();
        i.port = Some(0);
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_デフォルト値の補完() {
        let mut i = input();
        i.port = None;
        i.from_name = None;
        assert_eq!(i.port_or_default(), 587);
        assert_eq!(i.from_name_or_default(), "Sari");

        i.from_name = Some("My Store".to_string());
        assert_eq!(i.from_name_or_default(), "My Store");
    }

    #[test]
    fn test_接続情報のdebug出力はパスワードをマスクする() {
        let conn = SmtpConnection {
            host:       "smtp.example.com".to_string(),
            port:       587,
            username:   "user".to_string(),
            password:   "super-secret".to_string(),
            from_email: EmailAddress::new("noreply@example.com").unwrap(),
            from_name:  "Sari".to_string(),
        };
        let debug = format!("{conn:?}");
        assert!(debug.contains(crate::REDACTED));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_入力のdebug出力はパスワードをマスクする() {
        let debug = format!("{:?}", input());
        assert!(!debug.contains("secret"));
    }
}
