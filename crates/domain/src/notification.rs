//! # 通知
//!
//! 通知設定・通知ログに関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`NotificationPreference`] | マーチャント通知設定 | マーチャントごとに 1 行 |
//! | [`GlobalNotificationSettings`] | グローバル通知設定 | シングルトン。キルスイッチ |
//! | [`NotificationLog`] | 通知ログ | 追記専用の配信監査証跡 |
//! | [`NotificationKind`] | 通知種別 | 8 種類の閉集合 |
//! | [`DeliveryMethod`] | 配信方法 | push / email / both |
//! | [`NotificationStatus`] | 配信ステータス | pending → 終端状態へ単調遷移 |
//!
//! ## 設計方針
//!
//! - **キルスイッチ意味論**: 通知種別が配信可能なのは、グローバル設定と
//!   マーチャント設定の **両方** が有効な場合のみ（AND 結合）
//! - **単調なステータス遷移**: `pending` からのみ終端状態へ遷移できる。
//!   終端状態から戻る遷移は存在しない
//! - **マージ更新**: 設定更新は部分更新をマージする（置換ではない）
//! - **不活性な設定フィールド**: バッチ間隔・静穏時間帯は検証して保存する
//!   のみで、本サービス内に実行機構は存在しない

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    merchant::MerchantId,
    value_objects::TimeOfDay,
};

define_uuid_id! {
    /// 通知ログ ID（一意識別子）
    ///
    /// notification_logs テーブルの主キー。UUID v7 を使用するため
    /// 作成順に単調増加し、キーセットページネーションのカーソルに
    /// そのまま使える。
    pub struct NotificationLogId;
}

/// 通知種別
///
/// notification_logs テーブルの `kind` カラムに格納される値。
/// snake_case でシリアライズされる。
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
pub enum NotificationKind {
    /// 新規注文
    NewOrder,
    /// 新着メッセージ
    NewMessage,
    /// 予約
    Appointment,
    /// 注文ステータス変更
    OrderStatus,
    /// 未応答メッセージ
    MissedMessage,
    /// WhatsApp 接続切断
    WhatsappDisconnect,
    /// 週次レポート
    WeeklyReport,
    /// カスタム通知
    Custom,
}

/// 配信方法
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// プッシュ通知のみ
    Push,
    /// メールのみ
    Email,
    /// プッシュ通知とメールの両方（デフォルト）
    #[default]
    Both,
}

/// 配信ステータス
///
/// 遷移は `pending → {sent, failed, cancelled}` の一方向のみ。
/// 終端状態から他の状態への遷移は存在しない。
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
pub enum NotificationStatus {
    /// 配信試行前、または試行結果が未記録
    Pending,
    /// 配信成功
    Sent,
    /// 配信失敗
    Failed,
    /// 配信前にキャンセル
    Cancelled,
}

impl NotificationStatus {
    /// 終端状態かどうかを判定する
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// 通知ログ（エンティティ）
///
/// 配信試行ごとに 1 行。作成後はステータスの前進と
/// `error` / `sent_at` の記録以外で変更されない（追記専用の監査証跡）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id:          NotificationLogId,
    pub merchant_id: MerchantId,
    pub kind:        NotificationKind,
    pub method:      DeliveryMethod,
    pub title:       String,
    pub body:        String,
    /// アプリ内遷移用のディープリンク URL
    pub link:        Option<String>,
    pub status:      NotificationStatus,
    pub error:       Option<String>,
    /// 呼び出し元が付与する不透明なメタデータ
    pub metadata:    Option<serde_json::Value>,
    pub sent_at:     Option<DateTime<Utc>>,
    pub created_at:  DateTime<Utc>,
}

/// 通知ログの新規作成入力
///
/// ステータスは常に `pending` で挿入されるため、入力には含まない。
#[derive(Debug, Clone)]
pub struct NewNotificationLog {
    pub merchant_id: MerchantId,
    pub kind:        NotificationKind,
    pub method:      DeliveryMethod,
    pub title:       String,
    pub body:        String,
    pub link:        Option<String>,
    pub metadata:    Option<serde_json::Value>,
}

/// バッチ間隔の有効範囲（分）
const BATCH_INTERVAL_RANGE: std::ops::RangeInclusive<u16> = 1..=1440;

/// マーチャント通知設定（エンティティ）
///
/// マーチャントごとに最大 1 行。行が存在しないマーチャントには
/// [`NotificationPreference::defaults_for`] のデフォルト値が返される。
///
/// `instant_notifications` / `batch_notifications` / 静穏時間帯 /
/// バッチ間隔は設定として保存されるのみで、バッチ実行機構は
/// 本サービスの外にある。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub merchant_id:            MerchantId,
    pub new_orders:             bool,
    pub new_messages:           bool,
    pub appointments:           bool,
    pub order_status:           bool,
    pub missed_messages:        bool,
    pub whatsapp_disconnect:    bool,
    pub instant_notifications:  bool,
    pub batch_notifications:    bool,
    pub preferred_method:       DeliveryMethod,
    pub quiet_hours_enabled:    bool,
    pub quiet_hours_start:      TimeOfDay,
    pub quiet_hours_end:        TimeOfDay,
    pub batch_interval_minutes: u16,
}

/// マーチャント通知設定の部分更新
///
/// `None` のフィールドは現在値を維持する（マージ更新）。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPreferenceUpdate {
    pub new_orders:             Option<bool>,
    pub new_messages:           Option<bool>,
    pub appointments:           Option<bool>,
    pub order_status:           Option<bool>,
    pub missed_messages:        Option<bool>,
    pub whatsapp_disconnect:    Option<bool>,
    pub instant_notifications:  Option<bool>,
    pub batch_notifications:    Option<bool>,
    pub preferred_method:       Option<DeliveryMethod>,
    pub quiet_hours_enabled:    Option<bool>,
    pub quiet_hours_start:      Option<TimeOfDay>,
    pub quiet_hours_end:        Option<TimeOfDay>,
    pub batch_interval_minutes: Option<u16>,
}

impl NotificationPreference {
    /// 設定行を持たないマーチャントに適用されるデフォルト値を返す
    ///
    /// 種別トグルはすべて有効、即時通知は有効、バッチ通知は無効、
    /// 配信方法は `both`、静穏時間帯は無効（22:00〜08:00）、
    /// バッチ間隔は 30 分。
    pub fn defaults_for(merchant_id: MerchantId) -> Self {
        Self {
            merchant_id,
            new_orders: true,
            new_messages: true,
            appointments: true,
            order_status: true,
            missed_messages: true,
            whatsapp_disconnect: true,
            instant_notifications: true,
            batch_notifications: false,
            preferred_method: DeliveryMethod::Both,
            quiet_hours_enabled: false,
            quiet_hours_start: TimeOfDay::DEFAULT_QUIET_START,
            quiet_hours_end: TimeOfDay::DEFAULT_QUIET_END,
            batch_interval_minutes: 30,
        }
    }

    /// 部分更新をマージする
    ///
    /// `Some` のフィールドのみを上書きし、`None` のフィールドは
    /// 現在値を維持する。
    ///
    /// # エラー
    ///
    /// バッチ間隔が 1〜1440 分の範囲外の場合は
    /// `DomainError::Validation` を返し、自身は変更しない。
    pub fn apply(&mut self, update: NotificationPreferenceUpdate) -> Result<(), DomainError> {
        if let Some(interval) = update.batch_interval_minutes
            && !BATCH_INTERVAL_RANGE.contains(&interval)
        {
            return Err(DomainError::Validation(format!(
                "バッチ間隔は 1〜1440 分の範囲である必要があります: {interval}"
            )));
        }

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = update.$field {
                        self.$field = value;
                    }
                )*
            };
        }
        merge!(
            new_orders,
            new_messages,
            appointments,
            order_status,
            missed_messages,
            whatsapp_disconnect,
            instant_notifications,
            batch_notifications,
            preferred_method,
            quiet_hours_enabled,
            quiet_hours_start,
            quiet_hours_end,
            batch_interval_minutes,
        );

        Ok(())
    }

    /// マーチャントレベルで通知種別が有効かどうかを判定する
    ///
    /// 週次レポートとカスタム通知はマーチャント側にトグルを持たない
    /// ため常に `true`。
    pub fn kind_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::NewOrder => self.new_orders,
            NotificationKind::NewMessage => self.new_messages,
            NotificationKind::Appointment => self.appointments,
            NotificationKind::OrderStatus => self.order_status,
            NotificationKind::MissedMessage => self.missed_messages,
            NotificationKind::WhatsappDisconnect => self.whatsapp_disconnect,
            NotificationKind::WeeklyReport | NotificationKind::Custom => true,
        }
    }
}

/// グローバル通知設定（シングルトン）
///
/// マスタースイッチ。通知種別が配信可能なのは、対応するグローバル
/// フラグとマーチャントトグルの両方が有効な場合のみ（キルスイッチ）。
/// 週次レポートの曜日・時刻と管理者通知先もここで保持する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalNotificationSettings {
    pub new_orders:            bool,
    pub new_messages:          bool,
    pub appointments:          bool,
    pub order_status:          bool,
    pub missed_messages:       bool,
    pub whatsapp_disconnect:   bool,
    pub instant_notifications: bool,
    pub weekly_report:         bool,
    /// 週次レポートの送信曜日（0 = 日曜〜 6 = 土曜）
    pub weekly_report_day:     u8,
    pub weekly_report_time:    TimeOfDay,
    pub admin_email:           Option<crate::value_objects::EmailAddress>,
}

/// グローバル通知設定の部分更新
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalNotificationSettingsUpdate {
    pub new_orders:            Option<bool>,
    pub new_messages:          Option<bool>,
    pub appointments:          Option<bool>,
    pub order_status:          Option<bool>,
    pub missed_messages:       Option<bool>,
    pub whatsapp_disconnect:   Option<bool>,
    pub instant_notifications: Option<bool>,
    pub weekly_report:         Option<bool>,
    pub weekly_report_day:     Option<u8>,
    pub weekly_report_time:    Option<TimeOfDay>,
    pub admin_email:           Option<crate::value_objects::EmailAddress>,
}

impl Default for GlobalNotificationSettings {
    /// シード時のデフォルト: 全フラグ有効、週次レポートは月曜 09:00
    fn default() -> Self {
        Self {
            new_orders:            true,
            new_messages:          true,
            appointments:          true,
            order_status:          true,
            missed_messages:       true,
            whatsapp_disconnect:   true,
            instant_notifications: true,
            weekly_report:         true,
            weekly_report_day:     1,
            weekly_report_time:    TimeOfDay::DEFAULT_WEEKLY_REPORT,
            admin_email:           None,
        }
    }
}

impl GlobalNotificationSettings {
    /// 部分更新をマージする
    ///
    /// # エラー
    ///
    /// 週次レポートの曜日が 0〜6 の範囲外の場合は
    /// `DomainError::Validation` を返し、自身は変更しない。
    pub fn apply(
        &mut self,
        update: GlobalNotificationSettingsUpdate,
    ) -> Result<(), DomainError> {
        if let Some(day) = update.weekly_report_day
            && day > 6
        {
            return Err(DomainError::Validation(format!(
                "週次レポートの曜日は 0〜6 の範囲である必要があります: {day}"
            )));
        }

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = update.$field {
                        self.$field = value;
                    }
                )*
            };
        }
        merge!(
            new_orders,
            new_messages,
            appointments,
            order_status,
            missed_messages,
            whatsapp_disconnect,
            instant_notifications,
            weekly_report,
            weekly_report_day,
            weekly_report_time,
        );
        if let Some(email) = update.admin_email {
            self.admin_email = Some(email);
        }

        Ok(())
    }

    /// グローバルレベルで通知種別が有効かどうかを判定する
    pub fn kind_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::NewOrder => self.new_orders,
            NotificationKind::NewMessage => self.new_messages,
            NotificationKind::Appointment => self.appointments,
            NotificationKind::OrderStatus => self.order_status,
            NotificationKind::MissedMessage => self.missed_messages,
            NotificationKind::WhatsappDisconnect => self.whatsapp_disconnect,
            NotificationKind::WeeklyReport => self.weekly_report,
            NotificationKind::Custom => true,
        }
    }
}
