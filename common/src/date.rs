//! 日付の日単位比較
//!
//! 日付フィルタはフィールド値をローカル日付の `YYYY-MM-DD` に切り詰めてから
//! 文字列として範囲比較する。日付のみの文字列はUTC深夜として解釈されるので、
//! UTCより西のタイムゾーンでは前日になる。

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// ローカルタイムゾーンで日付文字列に変換
pub fn to_date_only_string(value: &Value) -> Option<String> {
    to_date_only_string_in(value, &Local)
}

/// 指定タイムゾーンで日付文字列（`YYYY-MM-DD`）に変換
///
/// 解釈できない値は `None`。
pub fn to_date_only_string_in<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<String> {
    calendar_day_in(value, tz).map(|day| day.format("%Y-%m-%d").to_string())
}

/// フィールド値を指定タイムゾーンの暦日に変換
///
/// - オフセット付きISO日時: その瞬間をタイムゾーンに変換
/// - `YYYY-MM-DD`: UTC深夜として扱う
/// - オフセット無しの日時: すでにローカル時刻とみなす
/// - 数値: エポックミリ秒
pub fn calendar_day_in<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_day_str(s.trim(), tz),
        Value::Number(n) => {
            let millis = n.as_f64()?;
            if !millis.is_finite() {
                return None;
            }
            let instant = Utc.timestamp_millis_opt(millis as i64).single()?;
            Some(instant.with_timezone(tz).date_naive())
        }
        _ => None,
    }
}

fn parse_day_str<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDate> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(tz).date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(midnight.with_timezone(tz).date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(s, format) {
            return Some(local.date());
        }
    }

    None
}

/// 入力フォームの日付（`YYYY-MM-DD`）をストア送信用のUTC深夜ISO文字列にする
pub fn to_store_date(date: &str) -> String {
    format!("{}T00:00:00Z", date)
}

/// ストアの日時から入力フォーム用の日付部分を取り出す
pub fn to_form_date(value: &str) -> String {
    value.split('T').next().unwrap_or_default().to_string()
}
