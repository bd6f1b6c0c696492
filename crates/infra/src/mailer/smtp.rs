//! SMTP メールゲートウェイ実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! SMTP 設定は管理者が随時変更できるため、トランスポートは
//! 送信のたびに復号済み接続情報から構築する。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use sari_domain::{
    email::{DeliveryError, EmailMessage},
    smtp::SmtpConnection,
};

use super::MailGateway;

/// ゲートウェイ呼び出し全体のタイムアウト
///
/// 超過した場合は `DeliveryError` として扱う。
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP メールゲートウェイ
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// STARTTLS（ポート 587）で接続し、認証情報を付与する。
#[derive(Debug, Default)]
pub struct SmtpMailGateway;

impl SmtpMailGateway {
    pub fn new() -> Self {
        Self
    }

    fn build_transport(
        connection: &SmtpConnection,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&connection.host)
            .map_err(|e| DeliveryError::Transport(format!("SMTP 接続の構築に失敗: {e}")))?;

        Ok(builder
            .port(connection.port)
            .credentials(Credentials::new(
                connection.username.clone(),
                connection.password.clone(),
            ))
            .timeout(Some(SEND_TIMEOUT))
            .build())
    }

    fn build_message(
        connection: &SmtpConnection,
        email: &EmailMessage,
    ) -> Result<Message, DeliveryError> {
        let from: Mailbox = format!("{} <{}>", connection.from_name, connection.from_email.as_str())
            .parse()
            .map_err(|e| DeliveryError::InvalidMessage(format!("送信元アドレス不正: {e}")))?;
        let to: Mailbox = email
            .to
            .as_str()
            .parse()
            .map_err(|e| DeliveryError::InvalidMessage(format!("宛先アドレス不正: {e}")))?;

        let builder = Message::builder().from(from).to(to).subject(&email.subject);

        let message = match &email.html_body {
            Some(html_body) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.clone()),
                    ),
            ),
            None => builder.body(email.text_body.clone()),
        }
        .map_err(|e| DeliveryError::InvalidMessage(format!("メッセージ構築失敗: {e}")))?;

        Ok(message)
    }
}

#[async_trait]
impl MailGateway for SmtpMailGateway {
    async fn send(
        &self,
        connection: &SmtpConnection,
        email: &EmailMessage,
    ) -> Result<(), DeliveryError> {
        let transport = Self::build_transport(connection)?;
        let message = Self::build_message(connection, email)?;

        // lettre 側のソケットタイムアウトに加え、呼び出し全体にも上限を設ける
        let result = tokio::time::timeout(SEND_TIMEOUT, transport.send(message)).await;

        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DeliveryError::Transport(format!("SMTP 送信失敗: {e}"))),
            Err(_) => Err(DeliveryError::Transport(format!(
                "SMTP 送信がタイムアウト（{} 秒）",
                SEND_TIMEOUT.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use sari_domain::value_objects::EmailAddress;

    use super::*;

    fn connection() -> SmtpConnection {
        SmtpConnection {
            host:       "smtp.example.com".to_string(),
            port:       587,
            username:   "user".to_string(),
            password:   "password".to_string(),
            from_email: EmailAddress::new("noreply@example.com").unwrap(),
            from_name:  "Sari".to_string(),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpMailGateway>();
    }

    #[test]
    fn test_テキストのみのメッセージを構築できる() {
        let email = EmailMessage {
            to:        EmailAddress::new("merchant@example.com").unwrap(),
            subject:   "件名".to_string(),
            text_body: "本文".to_string(),
            html_body: None,
        };
        assert!(SmtpMailGateway::build_message(&connection(), &email).is_ok());
    }

    #[test]
    fn test_html付きメッセージを構築できる() {
        let email = EmailMessage {
            to:        EmailAddress::new("merchant@example.com").unwrap(),
            subject:   "件名".to_string(),
            text_body: "本文".to_string(),
            html_body: Some("<p>本文</p>".to_string()),
        };
        assert!(SmtpMailGateway::build_message(&connection(), &email).is_ok());
    }
}
