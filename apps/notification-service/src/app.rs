//! # アプリケーション状態とルーター
//!
//! ユースケースを束ねた [`AppState`] と、全ルートを登録した
//! axum ルーターの構築を提供する。
//!
//! ## ルート構成
//!
//! | パス | 認可 |
//! |------|------|
//! | `/health` | なし |
//! | `/api/v1/merchants/{merchant_id}/notification-preferences` | 本人または管理者 |
//! | `/api/v1/admin/*` | 管理者のみ（[`require_admin`] ミドルウェア） |
//! | `/internal/notifications/dispatch` | サービス間通信（ゲートウェイで遮断） |
//!
//! [`require_admin`]: crate::auth::require_admin

use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use sari_infra::{
    crypto::SecretCipher,
    mailer::MailGateway,
    repository::{
        PostgresEmailLogRepository,
        PostgresMerchantRepository,
        PostgresNotificationLogRepository,
        PostgresNotificationPreferenceRepository,
        PostgresNotificationSettingsRepository,
        PostgresSmtpSettingsRepository,
    },
};
use sqlx::PgPool;

use crate::{
    auth::require_admin,
    handler,
    usecase::{
        DispatchUseCase,
        NotificationLogUseCase,
        PreferenceUseCase,
        SettingsUseCase,
        SmtpUseCase,
    },
};

/// アプリケーション状態
///
/// ハンドラから `State<Arc<AppState>>` で参照される。
/// テストではモックリポジトリで組み立てたユースケースを渡す。
pub struct AppState {
    pub preferences: PreferenceUseCase,
    pub settings:    SettingsUseCase,
    pub smtp:        SmtpUseCase,
    pub dispatch:    DispatchUseCase,
    pub logs:        NotificationLogUseCase,
}

impl AppState {
    /// PostgreSQL リポジトリで本番用の状態を組み立てる
    pub fn postgres(pool: PgPool, cipher: SecretCipher, gateway: Arc<dyn MailGateway>) -> Self {
        let merchants = Arc::new(PostgresMerchantRepository::new(pool.clone()));
        let preferences = Arc::new(PostgresNotificationPreferenceRepository::new(pool.clone()));
        let global_settings = Arc::new(PostgresNotificationSettingsRepository::new(pool.clone()));
        let notification_logs = Arc::new(PostgresNotificationLogRepository::new(pool.clone()));
        let email_logs = Arc::new(PostgresEmailLogRepository::new(pool.clone()));
        let smtp_settings = Arc::new(PostgresSmtpSettingsRepository::new(pool));
        let cipher = Arc::new(cipher);

        Self {
            preferences: PreferenceUseCase::new(merchants.clone(), preferences.clone()),
            settings:    SettingsUseCase::new(global_settings.clone()),
            smtp:        SmtpUseCase::new(
                smtp_settings.clone(),
                email_logs.clone(),
                gateway.clone(),
                cipher.clone(),
            ),
            dispatch:    DispatchUseCase::new(
                merchants,
                preferences,
                global_settings,
                notification_logs.clone(),
                email_logs,
                smtp_settings,
                gateway,
                cipher,
            ),
            logs:        NotificationLogUseCase::new(notification_logs),
        }
    }
}

/// 全ルートを登録したルーターを構築する
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route(
            "/smtp/settings",
            get(handler::smtp::get_settings).put(handler::smtp::put_settings),
        )
        .route("/smtp/test", post(handler::smtp::post_test))
        .route("/smtp/logs", get(handler::smtp::get_logs))
        .route("/smtp/stats", get(handler::smtp::get_stats))
        .route(
            "/notification-settings",
            get(handler::notification_settings::get_settings)
                .put(handler::notification_settings::put_settings),
        )
        .route(
            "/notification-logs",
            get(handler::notification_logs::list),
        )
        // ハンドラ・ストアに到達する前に管理者ロールを検証する
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/health", get(handler::health::health))
        .route(
            "/api/v1/merchants/{merchant_id}/notification-preferences",
            get(handler::preferences::get_preferences)
                .put(handler::preferences::put_preferences),
        )
        .nest("/api/v1/admin", admin_routes)
        .route(
            "/internal/notifications/dispatch",
            post(handler::dispatch::dispatch),
        )
        .with_state(state)
}
