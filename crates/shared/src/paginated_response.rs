//! # ページネーション付きレスポンス
//!
//! カーソルベースのページネーションに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリスト + カーソルのページネーション形式。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "next_cursor": "opaque-cursor-string"
/// }
/// ```
///
/// `next_cursor` が `null` の場合は最後のページを意味する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:        Vec<T>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_最終ページではnext_cursorがnullになる() {
        let response = PaginatedResponse {
            data:        vec![1, 2, 3],
            next_cursor: None,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["next_cursor"], serde_json::Value::Null);
    }

    #[test]
    fn test_カーソル付きレスポンスのシリアライズ() {
        let response = PaginatedResponse {
            data:        vec!["a"],
            next_cursor: Some("cursor-1".to_string()),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["next_cursor"], "cursor-1");
    }
}
