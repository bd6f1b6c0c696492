//! # Sari インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはストア・ゲートウェイのトレイトとその具体実装を提供する。
//! 外部システムの詳細をカプセル化し、ドメイン層をインフラの変更から
//! 保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **リポジトリ実装**: 通知設定・配信ログ・SMTP 設定の永続化
//! - **メールゲートウェイ**: lettre による SMTP 送信
//! - **秘密情報の暗号化**: SMTP パスワードの AES-256-GCM 暗号化
//!
//! ## 依存関係
//!
//! ```text
//! app → infra → domain → shared
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`crypto`] - AES-256-GCM による秘密情報の暗号化
//! - [`repository`] - リポジトリ実装
//! - [`mailer`] - メールゲートウェイ実装
//! - [`mock`] - テスト用インメモリ実装（`test-utils` フィーチャ）

pub mod crypto;
pub mod db;
pub mod error;
pub mod mailer;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::InfraError;
