//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`TimeOfDay`] | `(時, 分)` | 静穏時間帯・週次レポートの時刻（`HH:MM`） |
//! | [`EmailAddress`] | `String` | 送信先・送信元メールアドレス |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// TimeOfDay（壁時計時刻）
// =========================================================================

/// 壁時計時刻（値オブジェクト）
///
/// 静穏時間帯の開始・終了や週次レポートの送信時刻に使用する。
/// DB には `HH:MM` 文字列として保存し、JSON でも同じ形式で
/// シリアライズされる。
///
/// # 不変条件
///
/// - 時は 0〜23、分は 0〜59
/// - 文字列表現は常にゼロ埋め 5 文字（`"08:00"`, `"23:45"`）
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use sari_domain::value_objects::TimeOfDay;
///
/// let t: TimeOfDay = "22:00".parse()?;
/// assert_eq!(t.to_string(), "22:00");
/// assert_eq!(t.hour(), 22);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour:   u8,
    minute: u8,
}

impl TimeOfDay {
    /// 静穏時間帯のデフォルト開始時刻（22:00）
    pub const DEFAULT_QUIET_START: Self = Self { hour: 22, minute: 0 };
    /// 静穏時間帯のデフォルト終了時刻（08:00）
    pub const DEFAULT_QUIET_END: Self = Self { hour: 8, minute: 0 };
    /// 週次レポートのデフォルト送信時刻（09:00）
    pub const DEFAULT_WEEKLY_REPORT: Self = Self { hour: 9, minute: 0 };

    /// 時・分から時刻を作成する
    ///
    /// # エラー
    ///
    /// 時が 24 以上、または分が 60 以上の場合は
    /// `DomainError::Validation` を返す。
    pub fn new(hour: u8, minute: u8) -> Result<Self, DomainError> {
        if hour > 23 || minute > 59 {
            return Err(DomainError::Validation(format!(
                "時刻は 00:00〜23:59 の範囲である必要があります: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// 時（0〜23）を取得する
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// 分（0〜59）を取得する
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    /// `HH:MM` 形式の文字列をパースする
    ///
    /// ゼロ埋め 2 桁ずつ、区切りはコロン 1 文字のみを受け付ける。
    /// `"9:00"` や `"09:00:00"` は無効。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || DomainError::Validation(format!("時刻は HH:MM 形式である必要があります: {s:?}"));

        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// =========================================================================
// EmailAddress（メールアドレス）
// =========================================================================

/// メールアドレス（値オブジェクト）
///
/// 送信先・送信元・管理者通知先のメールアドレスを表現する。
/// PII（個人識別情報）のため、`Debug` 出力はマスクされる。
///
/// # バリデーション
///
/// - 前後の空白をトリム
/// - `local@domain` 形式（`@` がちょうど 1 個、local / domain とも非空）
/// - domain にドットを含む
/// - 最大 254 文字（RFC 5321 の上限）
///
/// 完全な RFC 5322 パースは行わない。配信可否の最終判定は
/// トランスポート層（lettre）が行う。
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// メールアドレスを作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();
        let invalid = || {
            DomainError::Validation("メールアドレスの形式が不正です".to_string())
        };

        if value.is_empty() || value.len() > 254 {
            return Err(invalid());
        }

        let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || value.contains(char::is_whitespace)
        {
            return Err(invalid());
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EmailAddress").field(&crate::REDACTED).finish()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.into_string()
    }
}

// =========================================================================
// テスト
// =========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    // TimeOfDay のテスト

    #[test]
    fn test_時刻の正常な生成() {
        let t = TimeOfDay::new(23, 59).unwrap();
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);
    }

    #[rstest]
    #[case(24, 0)]
    #[case(0, 60)]
    #[case(99, 99)]
    fn test_範囲外の時刻は無効(#[case] hour: u8, #[case] minute: u8) {
        assert!(TimeOfDay::new(hour, minute).is_err());
    }

    #[rstest]
    #[case("00:00", 0, 0)]
    #[case("08:00", 8, 0)]
    #[case("22:00", 22, 0)]
    #[case("23:59", 23, 59)]
    fn test_hhmm形式のパース(#[case] input: &str, #[case] hour: u8, #[case] minute: u8) {
        let t: TimeOfDay = input.parse().unwrap();
        assert_eq!(t, TimeOfDay::new(hour, minute).unwrap());
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("9:00", "時が 1 桁")]
    #[case("09:0", "分が 1 桁")]
    #[case("09:00:00", "秒付き")]
    #[case("24:00", "時が範囲外")]
    #[case("12:60", "分が範囲外")]
    #[case("ab:cd", "数値でない")]
    #[case("12-30", "区切りが不正")]
    fn test_不正な時刻文字列を拒否する(#[case] input: &str, #[case] _reason: &str) {
        assert!(input.parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_時刻の表示形式はゼロ埋めされる() {
        let t = TimeOfDay::new(8, 5).unwrap();
        assert_eq!(t.to_string(), "08:05");
    }

    #[test]
    fn test_時刻のjsonシリアライズは文字列() {
        let t = TimeOfDay::new(22, 0).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"22:00\"");

        let back: TimeOfDay = serde_json::from_str("\"22:00\"").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_デフォルトの静穏時間帯() {
        assert_eq!(TimeOfDay::DEFAULT_QUIET_START.to_string(), "22:00");
        assert_eq!(TimeOfDay::DEFAULT_QUIET_END.to_string(), "08:00");
    }

    // EmailAddress のテスト

    #[test]
    fn test_メールアドレスの正常な生成() {
        let email = EmailAddress::new("merchant@example.com").unwrap();
        assert_eq!(email.as_str(), "merchant@example.com");
    }

    #[test]
    fn test_メールアドレスは前後の空白をトリムする() {
        let email = EmailAddress::new("  a@b.com  ").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("plain", "@ なし")]
    #[case("@example.com", "local なし")]
    #[case("user@", "domain なし")]
    #[case("user@localhost", "domain にドットなし")]
    #[case("user@@example.com", "@ が複数")]
    #[case("user@.com", "domain がドット始まり")]
    #[case("user@example.com.", "domain がドット終わり")]
    #[case("us er@example.com", "空白を含む")]
    fn test_不正なメールアドレスを拒否する(#[case] input: &str, #[case] _reason: &str) {
        assert!(EmailAddress::new(input).is_err());
    }

    #[test]
    fn test_254文字を超えるメールアドレスを拒否する() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(EmailAddress::new(long).is_err());
    }

    #[test]
    fn test_メールアドレスのdebug出力はマスクされる() {
        let email = EmailAddress::new("secret@example.com").unwrap();
        let debug = format!("{email:?}");
        assert!(debug.contains(crate::REDACTED));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_メールアドレスのjsonラウンドトリップ() {
        let email = EmailAddress::new("a@b.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"a@b.com\"");

        let back: EmailAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, email);
    }
}
