//! # アプリケーション設定
//!
//! 環境変数から設定を読み込む。`.env` ファイルは main で
//! `dotenvy::dotenv()` により読み込まれる。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |-------|------|-----------|------|
//! | `APP_HOST` | - | `0.0.0.0` | バインドするホスト |
//! | `APP_PORT` | - | `8080` | バインドするポート |
//! | `DATABASE_URL` | ✓ | - | PostgreSQL 接続 URL |
//! | `SECRET_KEY_BASE64` | ✓ | - | SMTP パスワード暗号化鍵（base64、32 バイト） |
//! | `MAIL_BACKEND` | - | `smtp` | `smtp` または `noop` |
//! | `LOG_FORMAT` | - | `pretty` | `json` または `pretty` |

use std::env;

/// メール送信バックエンドの選択
///
/// `noop` は SMTP を持たないローカル開発環境向け。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    #[default]
    Smtp,
    Noop,
}

impl MailBackend {
    fn parse(s: &str) -> Self {
        match s {
            "noop" => Self::Noop,
            "smtp" => Self::Smtp,
            other => {
                eprintln!("WARNING: unknown MAIL_BACKEND={other:?}, falling back to smtp");
                Self::Smtp
            }
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host:              String,
    pub port:              u16,
    pub database_url:      String,
    /// AES-256-GCM 鍵（base64 エンコード、デコード後 32 バイト）
    pub secret_key_base64: String,
    pub mail_backend:      MailBackend,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// 必須の環境変数が未設定の場合は panic する（起動時に
    /// 設定不備を即座に検出するため）。
    pub fn from_env() -> Self {
        Self {
            host:              env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port:              env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("APP_PORT は有効なポート番号である必要があります"),
            database_url:      env::var("DATABASE_URL")
                .expect("環境変数 DATABASE_URL が設定されていません"),
            secret_key_base64: env::var("SECRET_KEY_BASE64")
                .expect("環境変数 SECRET_KEY_BASE64 が設定されていません"),
            mail_backend:      env::var("MAIL_BACKEND")
                .map(|v| MailBackend::parse(&v))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_メールバックエンドのパース() {
        assert_eq!(MailBackend::parse("smtp"), MailBackend::Smtp);
        assert_eq!(MailBackend::parse("noop"), MailBackend::Noop);
        // 不正な値は smtp にフォールバックする
        assert_eq!(MailBackend::parse("sendmail"), MailBackend::Smtp);
    }
}
