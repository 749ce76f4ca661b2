use crate::error::{AlistamientoError, Result};
use alistamiento_common::stats::DEFAULT_EXPIRING_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// データファイルを上書きする環境変数
pub const DATA_FILE_ENV: &str = "ALISTAMIENTO_DATA_FILE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ストアとして使うローカルJSONファイル
    pub data_file: Option<PathBuf>,
    /// 「期限間近」一覧の件数
    pub expiring_limit: usize,
    /// データファイルの代わりに組み込みのデモデータを使う
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            expiring_limit: DEFAULT_EXPIRING_LIMIT,
            use_mock: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), "設定を読み込み");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AlistamientoError::Config("No se encontró el directorio personal".into()))?;
        Ok(home.join(".config").join("alistamiento").join("config.json"))
    }

    /// 使用するデータファイル（環境変数を優先）
    pub fn data_file(&self) -> Option<PathBuf> {
        if let Ok(path) = std::env::var(DATA_FILE_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.data_file.clone()
    }

    pub fn set_expiring_limit(&mut self, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(AlistamientoError::Config(
                "El límite de vencimientos debe ser mayor a 0".into(),
            ));
        }
        self.expiring_limit = limit;
        Ok(())
    }
}
