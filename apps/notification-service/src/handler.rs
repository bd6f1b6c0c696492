//! # HTTP ハンドラ
//!
//! リクエストの取り出しとレスポンスへの変換のみを行う薄い層。
//! ビジネスロジックは [`crate::usecase`] に置く。
//!
//! レスポンスは単一データが `{ "data": … }`、一覧が
//! `{ "data": [...], "next_cursor": … }`、エラーが RFC 9457
//! Problem Details に統一される。

pub mod dispatch;
pub mod health;
pub mod notification_logs;
pub mod notification_settings;
pub mod preferences;
pub mod smtp;

/// 更新系エンドポイントの成功レスポンス
#[derive(Debug, serde::Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
