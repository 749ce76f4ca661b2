//! エラー型定義
//!
//! フィルタ・集計の純粋関数はエラーを返さない。
//! ここに現れるのは読み込みとフォーム検証の失敗だけ。

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid draft: {0}")]
    InvalidDraft(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
