//! # ロール
//!
//! API 呼び出し元のロールを定義する。
//!
//! ## 設計方針
//!
//! - **フラットなロール**: 階層・継承は持たない。管理者判定は
//!   `role == Admin` の単一条件のみ
//! - **認証は上流**: 認証は上流の BFF が終端する。本サービスは
//!   ヘッダで渡されたロールに基づく認可のみを行う

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// API 呼び出し元のロール
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
pub enum Role {
    /// 管理者。SMTP 設定・グローバル通知設定・ログ閲覧が可能
    Admin,
    /// マーチャント。自身の通知設定のみ操作可能
    Merchant,
}

impl Role {
    /// 管理者かどうかを判定する
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}
