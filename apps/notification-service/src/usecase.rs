//! # ユースケース層
//!
//! リポジトリ・ゲートウェイを編成するビジネスロジック。
//! ハンドラはリクエスト/レスポンスの変換のみを行い、
//! ロジックはすべてこの層に置く。
//!
//! ## 設計方針
//!
//! - **依存はトレイト経由**: 各ユースケースは `Arc<dyn Trait>` で
//!   リポジトリ・ゲートウェイを保持し、テストではモックに差し替える
//! - **ログ先行プロトコル**: 送信を伴う操作は、ゲートウェイ呼び出しの
//!   前に `pending` ログ行を永続化し、結果判明後にちょうど 1 回だけ
//!   ステータスを前進させる

use sari_domain::smtp::{SmtpConnection, SmtpSettings};
use sari_infra::crypto::SecretCipher;

use crate::error::ApiError;

pub mod dispatch;
pub mod logs;
pub mod preferences;
pub mod settings;
pub mod smtp;

pub use dispatch::{DispatchInput, DispatchOutcome, DispatchUseCase};
pub use logs::NotificationLogUseCase;
pub use preferences::PreferenceUseCase;
pub use settings::SettingsUseCase;
pub use smtp::SmtpUseCase;

/// 保存済み SMTP 設定からパスワードを復号し、送信用の接続情報を組み立てる
///
/// 復号済みの接続情報はゲートウェイの送信処理にのみ渡される。
fn decrypt_connection(
    settings: &SmtpSettings,
    cipher: &SecretCipher,
) -> Result<SmtpConnection, ApiError> {
    let password = cipher.decrypt_string(&settings.password_encrypted)?;
    Ok(SmtpConnection {
        host: settings.host.clone(),
        port: settings.port,
        username: settings.username.clone(),
        password,
        from_email: settings.from_email.clone(),
        from_name: settings.from_name.clone(),
    })
}
