//! # メールゲートウェイ
//!
//! SMTP 経由のメール送信を抽象化する。
//!
//! ## 設計方針
//!
//! - **トレイトによる抽象化**: ユースケース層は [`MailGateway`] 経由で送信し、
//!   テストではモックに差し替える
//! - **接続情報は送信ごとに受け取る**: SMTP 設定は DB に保存され管理者が
//!   随時変更できるため、トランスポートは送信のたびに構築する
//! - **失敗は [`DeliveryError`] に正規化**: 失敗理由はログ行の `error` に
//!   記録される。呼び出し元に返すかどうかはユースケース層が決める

use async_trait::async_trait;
use sari_domain::{email::DeliveryError, email::EmailMessage, smtp::SmtpConnection};

pub mod noop;
pub mod smtp;

pub use noop::NoopMailGateway;
pub use smtp::SmtpMailGateway;

/// メールゲートウェイトレイト
///
/// 成功は「トランスポートがメッセージを受理した」こと。
/// 最終的な到達性までは保証しない。
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// メールを送信する
    async fn send(
        &self,
        connection: &SmtpConnection,
        message: &EmailMessage,
    ) -> Result<(), DeliveryError>;
}
