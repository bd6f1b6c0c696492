//! # マーチャント
//!
//! マーチャント（テナント）のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`MerchantId`] | マーチャント ID | 全設定・ログの外部キー。UUID v7 |
//! | [`Merchant`] | マーチャント | 通知設定のスコープ単位となるテナント。連絡先メールを持つ |
//!
//! ## 設計方針
//!
//! - **テナント境界**: 通知設定・配信ログはすべてマーチャント単位でスコープされる
//! - **カスケード削除**: マーチャント削除時、配下の設定・ログは DB の
//!   `ON DELETE CASCADE` で自動的に削除される

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::EmailAddress;

define_uuid_id! {
    /// マーチャント ID（一意識別子）
    ///
    /// merchants テーブルの主キー。UUID v7 を使用。
    pub struct MerchantId;
}

define_validated_string! {
    /// マーチャント名
    ///
    /// 空文字列不可、最大 200 文字。
    pub struct MerchantName {
        label: "マーチャント名",
        max_length: 200,
    }
}

/// マーチャント（エンティティ）
///
/// 通知設定・配信ログのスコープ単位。本サービスでは通知設定の
/// 所有者としてのみ扱い、商品・注文などのコマース属性は持たない。
/// `email` はメール配信経路の宛先となる連絡先アドレス。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id:         MerchantId,
    pub name:       MerchantName,
    pub email:      EmailAddress,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_マーチャントidはuuidv7で生成される() {
        let id = MerchantId::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_マーチャントidはuuidから復元できる() {
        let id = MerchantId::new();
        let restored = MerchantId::from_uuid(*id.as_uuid());
        assert_eq!(id, restored);
    }

    #[test]
    fn test_マーチャント名の正常な生成() {
        let name = MerchantName::new("  Sari Store  ").unwrap();
        assert_eq!(name.as_str(), "Sari Store");
    }

    #[test]
    fn test_空のマーチャント名を拒否する() {
        assert!(MerchantName::new("   ").is_err());
    }

    #[test]
    fn test_200文字を超えるマーチャント名を拒否する() {
        assert!(MerchantName::new("あ".repeat(201)).is_err());
        assert!(MerchantName::new("あ".repeat(200)).is_ok());
    }
}
