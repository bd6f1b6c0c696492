//! 通知ログ一覧のユースケース
//!
//! 管理画面向けの監査証跡閲覧。UUID v7 のキーセットカーソルで
//! 新しい順にページングする。

use std::sync::Arc;

use sari_domain::notification::{NotificationLog, NotificationLogId};
use sari_infra::repository::{NotificationLogFilter, NotificationLogRepository};

use crate::error::ApiError;

/// 1 ページあたりの既定件数
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// 1 ページあたりの最大件数
pub const MAX_PAGE_SIZE: i64 = 100;

/// 通知ログ一覧の 1 ページ
#[derive(Debug, Clone)]
pub struct NotificationLogPage {
    pub logs:        Vec<NotificationLog>,
    /// 次ページ取得用のカーソル。最終ページでは `None`
    pub next_cursor: Option<NotificationLogId>,
}

/// 通知ログ一覧のユースケース
pub struct NotificationLogUseCase {
    notification_logs: Arc<dyn NotificationLogRepository>,
}

impl NotificationLogUseCase {
    pub fn new(notification_logs: Arc<dyn NotificationLogRepository>) -> Self {
        Self { notification_logs }
    }

    /// 通知ログを新しい順に一覧する
    ///
    /// `limit` は 1〜[`MAX_PAGE_SIZE`] に丸められる。
    /// ページが満杯のときのみ次カーソルを返す。
    #[tracing::instrument(skip_all)]
    pub async fn list(
        &self,
        filter: NotificationLogFilter,
        limit: Option<i64>,
        cursor: Option<NotificationLogId>,
    ) -> Result<NotificationLogPage, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let logs = self.notification_logs.list(&filter, limit, cursor).await?;

        let next_cursor = if logs.len() as i64 == limit {
            logs.last().map(|log| log.id.clone())
        } else {
            None
        };

        Ok(NotificationLogPage { logs, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sari_domain::{
        merchant::MerchantId,
        notification::{DeliveryMethod, NewNotificationLog, NotificationKind},
    };
    use sari_infra::mock::MockNotificationLogRepository;

    use super::*;

    async fn seed(repo: &MockNotificationLogRepository, merchant_id: &MerchantId, n: usize) {
        for i in 0..n {
            repo.insert(&NewNotificationLog {
                merchant_id: merchant_id.clone(),
                kind:        NotificationKind::NewOrder,
                method:      DeliveryMethod::Both,
                title:       format!("通知 {i}"),
                body:        "本文".to_string(),
                link:        None,
                metadata:    None,
            })
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_満杯のページのみ次カーソルを返す() {
        let repo = MockNotificationLogRepository::new();
        let merchant_id = MerchantId::new();
        seed(&repo, &merchant_id, 3).await;
        let usecase = NotificationLogUseCase::new(Arc::new(repo));

        let page1 = usecase
            .list(NotificationLogFilter::default(), Some(2), None)
            .await
            .unwrap();
        assert_eq!(page1.logs.len(), 2);
        let cursor = page1.next_cursor.clone().expect("次カーソルがあるはず");

        let page2 = usecase
            .list(NotificationLogFilter::default(), Some(2), Some(cursor))
            .await
            .unwrap();
        assert_eq!(page2.logs.len(), 1);
        assert!(page2.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_limitは最大値に丸められる() {
        let repo = MockNotificationLogRepository::new();
        let merchant_id = MerchantId::new();
        seed(&repo, &merchant_id, 2).await;
        let usecase = NotificationLogUseCase::new(Arc::new(repo));

        // 0 以下・上限超えはともに丸められ、エラーにならない
        assert_eq!(
            usecase
                .list(NotificationLogFilter::default(), Some(0), None)
                .await
                .unwrap()
                .logs
                .len(),
            1
        );
        assert!(
            usecase
                .list(NotificationLogFilter::default(), Some(10_000), None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_マーチャントで絞り込める() {
        let repo = MockNotificationLogRepository::new();
        let target = MerchantId::new();
        let other = MerchantId::new();
        seed(&repo, &target, 2).await;
        seed(&repo, &other, 3).await;
        let usecase = NotificationLogUseCase::new(Arc::new(repo));

        let page = usecase
            .list(
                NotificationLogFilter {
                    merchant_id: Some(target.clone()),
                    ..Default::default()
                },
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(page.logs.len(), 2);
        assert!(page.logs.iter().all(|log| log.merchant_id == target));
    }
}
