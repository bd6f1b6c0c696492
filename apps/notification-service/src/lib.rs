//! # Sari 通知サービス
//!
//! マーチャント通知設定・SMTP 設定・配信ログを管理し、
//! 内部向けの通知ディスパッチを提供する HTTP サービス。
//!
//! ## 構成
//!
//! | モジュール | 責務 |
//! |-----------|------|
//! | [`app`] | ルーター構築とアプリケーション状態 |
//! | [`auth`] | ヘッダベースの認可（認証は上流 BFF が終端） |
//! | [`config`] | 環境変数からの設定読み込み |
//! | [`error`] | API エラーと HTTP レスポンスへの変換 |
//! | [`handler`] | HTTP ハンドラ（リクエスト/レスポンス変換のみ） |
//! | [`usecase`] | ビジネスロジック（リポジトリ・ゲートウェイの編成） |

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
