//! # メール配信
//!
//! SMTP 経由で送信されるメールのドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`EmailMessage`] | メールメッセージ | ゲートウェイに渡される送信内容 |
//! | [`EmailLog`] | メールログ | SMTP 送信に特化した配信監査証跡 |
//! | [`EmailStatus`] | メール配信ステータス | pending → 終端状態へ単調遷移 |
//! | [`DeliveryError`] | 配信エラー | ゲートウェイのトランスポート/認証失敗 |
//!
//! ## 設計方針
//!
//! - **ログ先行プロトコル**: 送信試行の前に `pending` 行を永続化し、
//!   結果判明後にちょうど 1 回だけステータスを前進させる。プロセスが
//!   送信とステータス更新の間でクラッシュした場合、行は `pending` の
//!   まま残る（既知のギャップとして許容）
//! - **PII 保護**: 宛先アドレスは [`EmailAddress`] でラップされ、
//!   `Debug` 出力でマスクされる

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::{merchant::MerchantId, value_objects::EmailAddress};

define_uuid_id! {
    /// メールログ ID（一意識別子）
    ///
    /// email_logs テーブルの主キー。UUID v7 を使用。
    pub struct EmailLogId;
}

/// 配信エラー
///
/// ゲートウェイでの送信失敗を表す。失敗理由はログ行の `error` に
/// 記録され、呼び出し元には管理者向けテスト送信を除き汎用の
/// 内部エラーとして返される。
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// トランスポート・認証レベルの失敗（接続不可、認証失敗、タイムアウト）
    #[error("{0}")]
    Transport(String),

    /// メッセージの組み立てに失敗（アドレス・ヘッダ不正）
    #[error("メッセージの組み立てに失敗: {0}")]
    InvalidMessage(String),
}

/// メール配信ステータス
///
/// 遷移は `pending → {sent, failed}` の一方向のみ。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl EmailStatus {
    /// 終端状態かどうかを判定する
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// メールメッセージ
///
/// ゲートウェイに渡される送信内容。HTML 本文は任意で、
/// 存在する場合は multipart/alternative として送信される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to:        EmailAddress,
    pub subject:   String,
    pub text_body: String,
    pub html_body: Option<String>,
}

/// メールログ（エンティティ）
///
/// SMTP 送信試行ごとに 1 行。[`NotificationLog`] と同じ単調
/// ステータス不変条件を持つが、SMTP 固有のフィールド
/// （宛先、件名、メール種別）を持つ。
///
/// [`NotificationLog`]: crate::notification::NotificationLog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailLog {
    pub id:          EmailLogId,
    pub recipient:   EmailAddress,
    pub subject:     String,
    pub body:        String,
    pub status:      EmailStatus,
    pub error:       Option<String>,
    /// メールの用途タグ（"smtp_test", "notification" など）
    pub email_type:  Option<String>,
    pub merchant_id: Option<MerchantId>,
    pub metadata:    Option<serde_json::Value>,
    pub sent_at:     Option<DateTime<Utc>>,
    pub created_at:  DateTime<Utc>,
}

/// メールログの新規作成入力
///
/// ステータスは常に `pending` で挿入される。
#[derive(Debug, Clone)]
pub struct NewEmailLog {
    pub recipient:   EmailAddress,
    pub subject:     String,
    pub body:        String,
    pub email_type:  Option<String>,
    pub merchant_id: Option<MerchantId>,
    pub metadata:    Option<serde_json::Value>,
}

/// メール配信統計
///
/// 管理画面のダッシュボードに表示されるステータス別件数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailStats {
    pub sent:    i64,
    pub failed:  i64,
    pub pending: i64,
}
