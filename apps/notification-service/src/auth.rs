//! # 認可
//!
//! 呼び出し元の識別情報をヘッダから取り出す。認証は上流の BFF が
//! 終端しており、本サービスはヘッダで渡されたロールに基づく
//! 認可のみを行う。
//!
//! | ヘッダ | 内容 |
//! |--------|------|
//! | `X-Sari-Role` | `admin` または `merchant`（必須） |
//! | `X-Sari-Merchant-Id` | マーチャント ID（UUID、マーチャントロール時に必須） |

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sari_domain::{merchant::MerchantId, role::Role};
use uuid::Uuid;

use crate::error::ApiError;

/// ロールヘッダ名
pub const HEADER_ROLE: &str = "x-sari-role";

/// マーチャント ID ヘッダ名
pub const HEADER_MERCHANT_ID: &str = "x-sari-merchant-id";

/// 呼び出し元の識別情報
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role:        Role,
    pub merchant_id: Option<MerchantId>,
}

impl AuthContext {
    /// 指定のマーチャントのリソースを操作できるかを検証する
    ///
    /// 管理者は全マーチャントにアクセス可能。マーチャントロールは
    /// 自身の ID と一致する場合のみ許可される。
    pub fn authorize_merchant(&self, merchant_id: &MerchantId) -> Result<(), ApiError> {
        if self.role.is_admin() || self.merchant_id.as_ref() == Some(merchant_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "他のマーチャントの通知設定にはアクセスできません".to_string(),
            ))
        }
    }
}

fn parse_role(headers: &HeaderMap) -> Result<Role, ApiError> {
    let value = headers
        .get(HEADER_ROLE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized(format!("ヘッダ {HEADER_ROLE} が設定されていません"))
        })?;

    value
        .parse::<Role>()
        .map_err(|_| ApiError::Unauthorized(format!("不正なロール: {value}")))
}

fn parse_merchant_id(headers: &HeaderMap) -> Result<Option<MerchantId>, ApiError> {
    let Some(value) = headers.get(HEADER_MERCHANT_ID).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let uuid = value.parse::<Uuid>().map_err(|_| {
        ApiError::Unauthorized(format!("不正なマーチャント ID: {value}"))
    })?;
    Ok(Some(MerchantId::from_uuid(uuid)))
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            role:        parse_role(&parts.headers)?,
            merchant_id: parse_merchant_id(&parts.headers)?,
        })
    }
}

/// 管理者専用ルートのミドルウェア
///
/// 管理者ロール以外の呼び出しを 403 で拒否する。
/// ハンドラ・ストアに到達する前に評価される。
pub async fn require_admin(request: Request, next: Next) -> Response {
    match parse_role(request.headers()) {
        Ok(role) if role.is_admin() => next.run(request).await,
        Ok(_) => ApiError::Forbidden("管理者権限が必要です".to_string()).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(role: Option<&str>, merchant_id: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(role) = role {
            headers.insert(HEADER_ROLE, HeaderValue::from_str(role).unwrap());
        }
        if let Some(id) = merchant_id {
            headers.insert(HEADER_MERCHANT_ID, HeaderValue::from_str(id).unwrap());
        }
        headers
    }

    #[test]
    fn test_ロールヘッダのパース() {
        assert_eq!(parse_role(&headers(Some("admin"), None)).unwrap(), Role::Admin);
        assert_eq!(
            parse_role(&headers(Some("merchant"), None)).unwrap(),
            Role::Merchant
        );
    }

    #[test]
    fn test_ロールヘッダ欠落は401() {
        assert!(matches!(
            parse_role(&headers(None, None)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_不正なロールは401() {
        assert!(matches!(
            parse_role(&headers(Some("superuser"), None)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_マーチャントidヘッダのパース() {
        let id = MerchantId::new();
        let parsed = parse_merchant_id(&headers(None, Some(&id.to_string())))
            .unwrap()
            .unwrap();
        assert_eq!(parsed, id);

        assert!(parse_merchant_id(&headers(None, None)).unwrap().is_none());
        assert!(parse_merchant_id(&headers(None, Some("not-a-uuid"))).is_err());
    }

    #[test]
    fn test_マーチャントは自身のリソースのみ操作できる() {
        let own = MerchantId::new();
        let other = MerchantId::new();
        let ctx = AuthContext {
            role:        Role::Merchant,
            merchant_id: Some(own.clone()),
        };

        assert!(ctx.authorize_merchant(&own).is_ok());
        assert!(matches!(
            ctx.authorize_merchant(&other),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_管理者は全マーチャントのリソースを操作できる() {
        let ctx = AuthContext {
            role:        Role::Admin,
            merchant_id: None,
        };
        assert!(ctx.authorize_merchant(&MerchantId::new()).is_ok());
    }
}
