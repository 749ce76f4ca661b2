use super::{build_record, find_index, normalized, patch_record, sanitize_file_name, ListStore};
use crate::error::{AlistamientoError, Result};
use alistamiento_common::{Fields, Record};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ローカルJSONファイルをストアとして扱う
///
/// ファイルはストア内部名のままのレコード配列。
/// `{"value": [...]}` 形式（一覧APIのレスポンスそのまま）も読める。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListFile {
    Plain(Vec<Record>),
    Wrapped { value: Vec<Record> },
}

#[derive(Serialize)]
struct ListFileRef<'a> {
    value: &'a [Record],
}

impl JsonFileStore {
    /// ファイルを開く。存在しない場合は空のストアになる
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(AlistamientoError::Store(format!(
                "{} es un directorio",
                path.display()
            )));
        }

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<ListFile>(&content)? {
                ListFile::Plain(records) => records,
                ListFile::Wrapped { value } => value,
            }
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), count = records.len(), "データファイルを読み込み");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 添付ファイルのルート（`<stem>.attachments/`）
    pub fn attachments_root(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".into());
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.attachments", stem))
    }

    fn attachments_dir(&self, id: &str) -> PathBuf {
        self.attachments_root().join(id)
    }

    /// 書き込みに成功したときだけメモリ上の一覧を置き換える
    fn commit(&mut self, records: Vec<Record>) -> Result<()> {
        self.persist(&records)?;
        self.records = records;
        Ok(())
    }

    fn persist(&self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&ListFileRef { value: records })?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "データファイルを保存");
        Ok(())
    }
}

impl ListStore for JsonFileStore {
    fn fetch_all(&self) -> Result<Vec<Record>> {
        Ok(self.records.iter().map(normalized).collect())
    }

    fn fetch_by_id(&self, id: &str) -> Result<Record> {
        let index = find_index(&self.records, id)?;
        Ok(normalized(&self.records[index]))
    }

    fn create(&mut self, fields: Fields) -> Result<Record> {
        let record = build_record(&self.records, fields);
        let mut records = self.records.clone();
        records.push(record.clone());
        self.commit(records)?;
        tracing::info!(id = %record.id, "レコードを作成");
        Ok(normalized(&record))
    }

    fn update(&mut self, id: &str, fields: Fields) -> Result<Record> {
        let index = find_index(&self.records, id)?;
        let mut records = self.records.clone();
        patch_record(&mut records[index], fields);
        self.commit(records)?;
        tracing::info!(id, "レコードを更新");
        Ok(normalized(&self.records[index]))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let index = find_index(&self.records, id)?;
        let mut records = self.records.clone();
        records.remove(index);
        self.commit(records)?;

        let dir = self.attachments_dir(id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        tracing::info!(id, "レコードを削除");
        Ok(())
    }

    fn upload_attachment(&mut self, id: &str, file_name: &str, content: &[u8]) -> Result<()> {
        find_index(&self.records, id)?;
        let name = sanitize_file_name(file_name)?;

        let dir = self.attachments_dir(id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(&name), content)?;
        tracing::info!(id, file = %name, bytes = content.len(), "添付ファイルを保存");
        Ok(())
    }

    fn list_attachments(&self, id: &str) -> Result<Vec<String>> {
        find_index(&self.records, id)?;

        let dir = self.attachments_dir(id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

