//! フィールド値の変換ヘルパー
//!
//! ストアから届く値は文字列・数値・真偽値・nullが混在する。
//! 真偽判定と文字列化の規則をここに集約する。

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    // 指数部は数字が続く場合のみ採用
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid float regex");
}

/// 値が「空でない」か判定する
///
/// null・空文字・0・false・NaN を偽とみなす。
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `Option<&Value>` 版の真偽判定（欠損は偽）
pub fn is_present(value: Option<&Value>) -> bool {
    value.map_or(false, is_truthy)
}

/// 値を表示用の文字列にする
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 数値を整数なら小数点なしで文字列化する（5.0 → "5"）
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// 値を数値に変換する。変換できなければ `None`
///
/// 数値はそのまま、文字列は前後の空白を除いて全体をパースする。
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };

    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

/// 文字列先頭の数値部分だけを読む（"50%" → 50, "1.2.3" → 1.2）
///
/// 先頭の空白、符号、小数点、指数部を受け付ける。数字が一つもなければ `None`。
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    FLOAT_PREFIX
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
