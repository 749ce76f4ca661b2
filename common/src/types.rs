//! レコードの型定義
//!
//! ストアから届くリストアイテムをそのまま保持する:
//! - Record: 1台分の機械（id・タイムスタンプ・フィールド群）
//! - Fields: 内部名と表示名が混在する順序付きフィールドマップ

use crate::field_mapping;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 整備中の機械1台分のレコード
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// ストアが採番するID（クライアントは変更しない）
    pub id: String,

    #[serde(default)]
    pub fields: Fields,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            ..Default::default()
        }
    }
}

/// フィールドマップ
///
/// キーの挿入順を保持する。あいまい検索は最初に一致したキーを採用するため、
/// 順序を並べ替えてはならない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 表示名でフィールド値を取得（3段階の解決）
    ///
    /// 1. 表示名そのもの
    /// 2. 逆引きした内部名
    /// 3. Unicodeエスケープ名のあいまい一致
    pub fn get(&self, friendly_name: &str) -> Option<&Value> {
        field_mapping::get_field_value(self, friendly_name)
    }

    /// キーを解決せずにそのまま取得
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// キーを削除する（preserve_order のため後続キーの順序は保たれる）
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// 別のマップの値で上書き・追加する
    pub fn merge(&mut self, other: Fields) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
