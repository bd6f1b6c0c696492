//! # Sari ドメイン層
//!
//! 通知設定・配信ログに関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Merchant,
//!   NotificationPreference）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: EmailAddress,
//!   TimeOfDay）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! app → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、SMTP）には一切依存しない。
//! これにより、通知可否判定や設定マージのロジックが純粋に保たれる。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`merchant`] - マーチャント（テナント）の識別子とエンティティ
//! - [`notification`] - 通知設定・通知ログのドメインモデル
//! - [`email`] - メールメッセージと配信エラー
//! - [`smtp`] - SMTP 接続設定
//! - [`role`] - API 呼び出し元のロール

#[macro_use]
mod macros;

pub mod email;
pub mod error;
pub mod merchant;
pub mod notification;
pub mod role;
pub mod smtp;
pub mod value_objects;

pub use error::DomainError;

/// PII マスキング時の表示文字列
pub const REDACTED: &str = "[REDACTED]";
