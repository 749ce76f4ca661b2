//! 進捗率計算モジュール
//!
//! 16フェーズの状態から全体の進捗率を求める。
//! 正式な値はストアの計算列が持つので、ここでの計算はその値が無い場合
//! （ローカルのフィクスチャなど）の代替表示用。

use crate::field_mapping::names;
use crate::types::Fields;
use crate::value::parse_float_prefix;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// フェーズ数
pub const PHASE_COUNT: usize = 16;

/// フェーズごとの重み（F1..F16、合計1.0）
pub const PHASE_WEIGHTS: [f64; PHASE_COUNT] = [
    0.02272727272727, // F1
    0.02272727272727, // F2
    0.04545454545455, // F3
    0.02272727272727, // F4
    0.04545454545455, // F5
    0.11363636363636, // F6
    0.13636363636364, // F7
    0.09090909090909, // F8
    0.13636363636364, // F9
    0.06818181818182, // F10
    0.04545454545455, // F11
    0.04545454545455, // F12
    0.02272727272727, // F13
    0.02272727272727, // F14
    0.13636363636364, // F15
    0.02272727272727, // F16
];

/// フェーズ状態の選択肢
pub const PHASE_OPTIONS: [&str; 5] = ["0%", "25%", "50%", "75%", "100%"];

lazy_static! {
    static ref NON_NUMERIC: Regex = Regex::new(r"[^0-9.]").expect("valid numeric regex");
}

/// フェーズ値をパーセント数値に変換（"50%" → 50, 75 → 75）
///
/// 欠損・null・解釈できない値は 0。
pub fn phase_percentage(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::String(s)) => parse_float_prefix(&s.replace('%', "")),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };

    match parsed {
        Some(p) if p.is_finite() => p,
        _ => 0.0,
    }
}

/// フェーズ F1..F16 から全体進捗率（0〜100、小数2桁）を計算する
pub fn calculate_progress(fields: &Fields) -> f64 {
    let total: f64 = names::PHASES
        .iter()
        .zip(PHASE_WEIGHTS.iter())
        .map(|(phase, weight)| phase_percentage(fields.get(phase)) / 100.0 * weight)
        .sum();

    let rounded = round_to_cents(total * 100.0);
    if rounded.is_finite() {
        rounded
    } else {
        0.0
    }
}

/// 小数2桁に丸める（ちょうど半分は切り上げ）
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// 保存済みの全体進捗率を数値として読む
///
/// 文字列は数字と小数点以外を除いてからパースする（"97%" → 97）。
/// 数値はそのまま。null・欠損・解釈できない値は 0。
/// フィルタ・並べ替え・統計のすべてでこの規則を使う。
pub fn parse_percentage(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::String(s)) => parse_float_prefix(&NON_NUMERIC.replace_all(s, "")),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match parsed {
        Some(p) if p.is_finite() => p,
        _ => 0.0,
    }
}

/// レコードの全体進捗率（ストアの計算列）
pub fn overall_progress(fields: &Fields) -> f64 {
    parse_percentage(fields.get(names::PORCENTAJE_AVANCE_TOTAL))
}

/// 表示用の進捗率
///
/// 計算列があればその値、無ければフェーズから計算した値。
pub fn display_progress(fields: &Fields) -> f64 {
    match fields.get(names::PORCENTAJE_AVANCE_TOTAL) {
        Some(value) if !value.is_null() => parse_percentage(Some(value)),
        _ => calculate_progress(fields),
    }
}
