//! 何もしないメールゲートウェイ
//!
//! SMTP が未設定の開発環境やプッシュ配信のみの経路で使用する。
//! 送信内容をログに出力して成功を返す。

use async_trait::async_trait;
use sari_domain::{
    email::{DeliveryError, EmailMessage},
    smtp::SmtpConnection,
};

use super::MailGateway;

/// ログ出力のみ行うゲートウェイ
#[derive(Debug, Default)]
pub struct NoopMailGateway;

impl NoopMailGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailGateway for NoopMailGateway {
    async fn send(
        &self,
        connection: &SmtpConnection,
        email: &EmailMessage,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            host = %connection.host,
            subject = %email.subject,
            "メール送信をスキップ（noop ゲートウェイ）"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopMailGateway>();
    }
}
