//! リストストア
//!
//! レコードの取得・作成・更新・削除と添付ファイルの保存を担う。
//! 取得したレコードは表示名に正規化して返す。書き込みはストア内部名で受け取る。

mod fixture;
mod json_file;

pub use fixture::{demo_records, MemoryStore};
pub use json_file::JsonFileStore;

use crate::error::{AlistamientoError, Result};
use alistamiento_common::date::calendar_day_in;
use alistamiento_common::field_mapping::{internal_name, names, normalize};
use alistamiento_common::progress::calculate_progress;
use alistamiento_common::{Fields, Record};
use chrono::{Local, NaiveDate, Utc};
use serde_json::Value;

/// 進捗率の計算列（ストア内部名）
pub const PROGRESS_COLUMN: &str = "_x0025__x0020_avance_x0020_total";

/// 残り日数の計算列（ストア内部名）
pub const DAYS_COLUMN: &str = "D_x00ed_as_x0020_faltantes_x0020";

pub trait ListStore {
    /// 全レコードを取得
    fn fetch_all(&self) -> Result<Vec<Record>>;

    /// IDでレコードを取得
    fn fetch_by_id(&self, id: &str) -> Result<Record>;

    /// レコードを作成し、採番されたレコードを返す
    fn create(&mut self, fields: Fields) -> Result<Record>;

    /// 指定フィールドだけを上書きする
    fn update(&mut self, id: &str, fields: Fields) -> Result<Record>;

    fn delete(&mut self, id: &str) -> Result<()>;

    fn upload_attachment(&mut self, id: &str, file_name: &str, content: &[u8]) -> Result<()>;

    fn list_attachments(&self, id: &str) -> Result<Vec<String>>;
}

/// 計算列を埋める
///
/// 進捗率はフェーズから計算し、残り日数は商業約束日までの日数。
/// 約束日が無い・読めない場合は残り日数の列を削除する。
pub fn fill_computed_columns(fields: &mut Fields, today: NaiveDate) {
    let progress = calculate_progress(fields);
    // 先頭アンダースコア無しの別名は残さない
    fields.remove(&PROGRESS_COLUMN[1..]);
    fields.insert(PROGRESS_COLUMN, Value::from(progress));

    let commitment = fields
        .get(names::FECHA_COMPROMISO_COMERCIAL)
        .and_then(|v| calendar_day_in(v, &Utc));

    match commitment {
        Some(day) => {
            let days = (day - today).num_days();
            fields.insert(DAYS_COLUMN, Value::from(days));
        }
        None => {
            fields.remove(DAYS_COLUMN);
        }
    }
}

/// 表示名のキーをストア内部名に揃える（内部名があるキーのみ）
pub(crate) fn to_internal_keys(fields: Fields) -> Fields {
    fields
        .into_map()
        .into_iter()
        .map(|(key, value)| match internal_name(&key) {
            Some(internal) => (internal.to_string(), value),
            None => (key, value),
        })
        .collect()
}

pub(crate) fn normalized(record: &Record) -> Record {
    Record {
        fields: normalize(&record.fields),
        ..record.clone()
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// 数値IDの最大値 + 1
pub(crate) fn next_id(records: &[Record]) -> String {
    let max = records
        .iter()
        .filter_map(|r| r.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

pub(crate) fn find_index(records: &[Record], id: &str) -> Result<usize> {
    records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| AlistamientoError::RecordNotFound(id.to_string()))
}

/// 新しいレコードを組み立てる（計算列とタイムスタンプ付き）
pub(crate) fn build_record(records: &[Record], fields: Fields) -> Record {
    let mut fields = to_internal_keys(fields);
    fill_computed_columns(&mut fields, today());
    let timestamp = now_timestamp();

    Record {
        id: next_id(records),
        fields,
        created_date_time: Some(timestamp.clone()),
        last_modified_date_time: Some(timestamp),
    }
}

/// 既存レコードにフィールドを上書きする
pub(crate) fn patch_record(record: &mut Record, fields: Fields) {
    record.fields.merge(to_internal_keys(fields));
    fill_computed_columns(&mut record.fields, today());
    record.last_modified_date_time = Some(now_timestamp());
}

/// 添付ファイル名からディレクトリ部分を取り除く
pub(crate) fn sanitize_file_name(file_name: &str) -> Result<String> {
    let name = std::path::Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.is_empty() {
        return Err(AlistamientoError::InvalidInput(format!(
            "Nombre de archivo no válido: '{}'",
            file_name
        )));
    }
    Ok(name.to_string())
}

/// 設定に応じてストアを開く
///
/// デモ指定またはデータファイル未設定ならデモデータ。
/// データファイルが読めない場合は警告を出してデモデータに切り替える。
pub fn open_store(data_file: Option<&std::path::Path>, use_mock: bool) -> Box<dyn ListStore> {
    let path = match data_file {
        Some(path) if !use_mock => path,
        _ => {
            tracing::debug!("デモデータを使用");
            return Box::new(MemoryStore::demo());
        }
    };

    match JsonFileStore::open(path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "データファイルを読み込めないためデモデータを使用");
            Box::new(MemoryStore::demo())
        }
    }
}
