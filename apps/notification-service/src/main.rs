//! 通知サービスのエントリポイント
//!
//! 設定読み込み → DB 接続・マイグレーション → 状態の組み立て →
//! HTTP サーバー起動の順で初期化する。

use std::sync::Arc;

use anyhow::Context as _;
use sari_infra::{
    crypto::SecretCipher,
    db,
    mailer::{MailGateway, NoopMailGateway, SmtpMailGateway},
};
use sari_notification_service::{
    app::{AppState, build_router},
    config::{AppConfig, MailBackend},
};
use sari_shared::observability::{TracingConfig, init_tracing};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(TracingConfig::from_env("notification-service"));

    let config = AppConfig::from_env();

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続プールの作成に失敗")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗")?;

    let cipher = SecretCipher::from_base64(&config.secret_key_base64)
        .context("SECRET_KEY_BASE64 の読み込みに失敗")?;
    let gateway: Arc<dyn MailGateway> = match config.mail_backend {
        MailBackend::Smtp => Arc::new(SmtpMailGateway::new()),
        MailBackend::Noop => Arc::new(NoopMailGateway::new()),
    };

    let state = Arc::new(AppState::postgres(pool, cipher, gateway));
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{addr} のバインドに失敗"))?;
    tracing::info!(%addr, "通知サービスを起動");

    axum::serve(listener, app)
        .await
        .context("サーバーの実行に失敗")?;
    Ok(())
}
