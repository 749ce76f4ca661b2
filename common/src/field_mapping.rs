//! フィールド名マッピングモジュール
//!
//! ストア内部名（`field_0`, `field_1`, …、Unicodeエスケープされた計算列名）と
//! 表示名（`Serie`, `Prioridad`, …）を相互に変換する。
//!
//! 計算列の名前はストア側でロケール依存のエスケープが付くため事前に確定できない。
//! そのため `get_field_value` は完全一致で見つからない場合にあいまい一致へ落ちる。
//! 生のキーを直接調べるのはこのモジュールだけにすること。

use crate::types::Fields;
use crate::value::is_truthy;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// 表示名の定数
pub mod names {
    pub const TITLE: &str = "Title";
    pub const SERIE: &str = "Serie";
    pub const PRIORIDAD: &str = "Prioridad";
    pub const MODELO: &str = "Modelo";
    pub const OTT: &str = "OTT";
    pub const ASESOR: &str = "Asesor";
    pub const FECHA_SOLICITUD: &str = "FechaSolicitud";
    pub const OBSERVACIONES: &str = "Observaciones";
    pub const FECHA_COMPROMISO_COMERCIAL: &str = "FechaCompromisoComercial";
    pub const FECHA_INICIO_CICLO: &str = "FechaInicioCiclo";
    pub const SEDE: &str = "Sede";
    pub const CICLO: &str = "Ciclo";
    pub const PORCENTAJE_AVANCE_TOTAL: &str = "PorcentajeAvanceTotal";
    pub const DIAS_RESTANTES: &str = "DiasRestantes";
    pub const FECHA_FINAL_ALISTAMIENTO: &str = "FechaFinalAlistamiento";

    /// フェーズ F1..F16 の表示名
    pub const PHASES: [&str; 16] = [
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
        "F15", "F16",
    ];
}

/// ストア内部名 → 表示名（定義順が逆引きの優先順位になる）
pub const FIELD_MAPPING: &[(&str, &str)] = &[
    // 標準フィールド
    ("Title", "Title"),
    // 数値付き内部名
    ("field_0", "Serie"),
    ("field_1", "Prioridad"),
    ("field_2", "Modelo"),
    ("field_3", "OTT"),
    ("field_4", "Asesor"),
    ("field_7", "FechaSolicitud"),
    ("field_8", "Observaciones"),
    ("field_9", "FechaCompromisoComercial"),
    ("field_10", "FechaInicioCiclo"),
    // フェーズ F1..F16
    ("field_11", "F1"),
    ("field_12", "F2"),
    ("field_13", "F3"),
    ("field_14", "F4"),
    ("field_15", "F5"),
    ("field_16", "F6"),
    ("field_17", "F7"),
    ("field_18", "F8"),
    ("field_19", "F9"),
    ("field_20", "F10"),
    ("field_21", "F11"),
    ("field_22", "F12"),
    ("field_23", "F13"),
    ("field_24", "F14"),
    ("field_25", "F15"),
    ("field_26", "F16"),
    // その他
    ("field_28", "Sede"),
    ("field_29", "Ciclo"),
    // 計算列（先頭のアンダースコアは付く場合と付かない場合がある）
    ("_x0025__x0020_avance_x0020_total", "PorcentajeAvanceTotal"),
    ("x0025__x0020_avance_x0020_total", "PorcentajeAvanceTotal"),
    ("D_x00ed_as_x0020_faltantes_x0020", "DiasRestantes"),
    // 名前が変わらないフィールド
    ("FechaFinalAlistamiento", "FechaFinalAlistamiento"),
];

lazy_static! {
    static ref FORWARD: HashMap<&'static str, &'static str> =
        FIELD_MAPPING.iter().copied().collect();

    /// 表示名 → 内部名。同名マッピングは除外し、後の定義が優先される
    static ref REVERSE: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for (internal, friendly) in FIELD_MAPPING {
            if internal != friendly {
                map.insert(*friendly, *internal);
            }
        }
        map
    };

    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

/// 内部名から表示名を引く
pub fn friendly_name(internal: &str) -> Option<&'static str> {
    FORWARD.get(internal).copied()
}

/// 表示名から内部名を引く（同名マッピングは `None`）
pub fn internal_name(friendly: &str) -> Option<&'static str> {
    REVERSE.get(friendly).copied()
}

/// 内部名のフィールドを表示名に変換する
///
/// 表示名に値を入れたうえで、元のキーも（まだ値が無ければ）残す。
/// マッピングの無いキーはそのまま通す。
pub fn normalize(fields: &Fields) -> Fields {
    let mut normalized = Fields::new();

    for (key, value) in fields {
        let mapped = friendly_name(key).unwrap_or(key.as_str());
        normalized.insert(mapped, value.clone());

        if mapped != key && !normalized.raw(key).map_or(false, is_truthy) {
            normalized.insert(key.as_str(), value.clone());
        }
    }

    normalized
}

/// 表示名のフィールドをストア内部名に戻す（作成・更新の送信用）
pub fn denormalize(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(key, value)| {
            let mapped = internal_name(key).unwrap_or(key.as_str());
            (mapped.to_string(), value.clone())
        })
        .collect()
}

/// 表示名でフィールド値を取得する
///
/// 解決順序は固定: 表示名の完全一致 → 内部名の完全一致 → あいまい一致。
/// あいまい一致は入力のキー順で最初に当たったものを返す。
pub fn get_field_value<'a>(fields: &'a Fields, field_name: &str) -> Option<&'a Value> {
    if let Some(value) = fields.raw(field_name) {
        return Some(value);
    }

    if let Some(internal) = internal_name(field_name) {
        if let Some(value) = fields.raw(internal) {
            return Some(value);
        }
    }

    let target = squash(&field_name.to_lowercase());
    fields
        .iter()
        .find(|(key, _)| fuzzy_matches(key, field_name, &target))
        .map(|(_, value)| value)
}

/// エスケープを戻し、小文字化して空白を除いたキー
fn unescape_key(key: &str) -> String {
    let replaced = key
        .replace("_x0020_", " ")
        .replace("_x0025_", "%")
        .replace("x0025__x0020_", "% ")
        .replace("_x00ed_", "í");
    squash(&replaced.to_lowercase())
}

fn squash(s: &str) -> String {
    WHITESPACE.replace_all(s, "").into_owned()
}

fn fuzzy_matches(key: &str, field_name: &str, target: &str) -> bool {
    let normalized_key = unescape_key(key);

    if normalized_key.contains(target) || target.contains(normalized_key.as_str()) {
        return true;
    }

    if field_name == names::PORCENTAJE_AVANCE_TOTAL {
        return (normalized_key.contains("avance") && normalized_key.contains("total"))
            || (key.contains("x0025") && key.contains("avance"));
    }

    false
}
