//! MerchantRepository: マーチャントの永続化
//!
//! 通知設定・配信ログの所有者となるテナント行を管理する。
//! マーチャント削除時、配下の設定・ログは DB の `ON DELETE CASCADE` で
//! 自動的に削除される。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sari_domain::{
    merchant::{Merchant, MerchantId, MerchantName},
    value_objects::EmailAddress,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// MerchantRepository トレイト
#[async_trait]
pub trait MerchantRepository: Send + Sync {
    /// マーチャントが存在するかを確認する
    async fn exists(&self, id: &MerchantId) -> Result<bool, InfraError>;

    /// ID でマーチャントを検索する
    async fn find_by_id(&self, id: &MerchantId) -> Result<Option<Merchant>, InfraError>;

    /// 新規マーチャントを作成する
    async fn insert(&self, merchant: &Merchant) -> Result<(), InfraError>;

    /// マーチャントを削除する
    ///
    /// 配下の通知設定・通知ログは FK のカスケードで削除される。
    /// 削除対象が存在した場合は `true` を返す。
    async fn delete(&self, id: &MerchantId) -> Result<bool, InfraError>;
}

/// DB の merchants テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct MerchantRow {
    id:         Uuid,
    name:       String,
    email:      String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MerchantRow> for Merchant {
    type Error = InfraError;

    fn try_from(row: MerchantRow) -> Result<Self, Self::Error> {
        Ok(Merchant {
            id:         MerchantId::from_uuid(row.id),
            name:       MerchantName::new(row.name)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            email:      EmailAddress::new(row.email)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL 実装
pub struct PostgresMerchantRepository {
    pool: PgPool,
}

impl PostgresMerchantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchantRepository for PostgresMerchantRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn exists(&self, id: &MerchantId) -> Result<bool, InfraError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM merchants WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_id(&self, id: &MerchantId) -> Result<Option<Merchant>, InfraError> {
        let row: Option<MerchantRow> =
            sqlx::query_as("SELECT id, name, email, created_at FROM merchants WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Merchant::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, merchant: &Merchant) -> Result<(), InfraError> {
        sqlx::query("INSERT INTO merchants (id, name, email, created_at) VALUES ($1, $2, $3, $4)")
            .bind(merchant.id.as_uuid())
            .bind(merchant.name.as_str())
            .bind(merchant.email.as_str())
            .bind(merchant.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn delete(&self, id: &MerchantId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM merchants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresMerchantRepository>();
    }
}
