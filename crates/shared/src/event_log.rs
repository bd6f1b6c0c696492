//! # ビジネスイベントログの構造化ヘルパー
//!
//! `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"`
//! マーカーが自動付与され、
//! `jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットな
//! キーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.merchant_id`: マーチャント ID
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
        pub const EMAIL: &str = "email";
        pub const SMTP: &str = "smtp";
        pub const SETTINGS: &str = "settings";
    }

    /// イベントアクション
    pub mod action {
        // 通知配信
        pub const NOTIFICATION_DISPATCHED: &str = "notification.dispatched";
        pub const NOTIFICATION_SUPPRESSED: &str = "notification.suppressed";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // メール配信
        pub const EMAIL_SENT: &str = "email.sent";
        pub const EMAIL_FAILED: &str = "email.failed";
        pub const EMAIL_TEST_SENT: &str = "email.test_sent";

        // 設定変更
        pub const PREFERENCES_UPDATED: &str = "settings.preferences_updated";
        pub const GLOBAL_SETTINGS_UPDATED: &str = "settings.global_updated";
        pub const SMTP_SETTINGS_UPDATED: &str = "settings.smtp_updated";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const NOTIFICATION_LOG: &str = "notification_log";
        pub const EMAIL_LOG: &str = "email_log";
        pub const NOTIFICATION_PREFERENCE: &str = "notification_preference";
        pub const SMTP_SETTINGS: &str = "smtp_settings";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        pub const SUPPRESSED: &str = "suppressed";
    }
}
